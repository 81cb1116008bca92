mod cli;
mod error;

use clap::Parser;
use tracing_subscriber::EnvFilter;

use eapi::{CallOptions, Command, LoginOptions, Session, SessionConfig, TlsMode};

use crate::cli::{Cli, CliCommand, ExecuteArgs, GlobalOpts};
use crate::error::CliError;

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    init_tracing(cli.global.verbose);

    if let Err(err) = run(cli).await {
        let code = err.exit_code();
        eprintln!("{:?}", miette::Report::new(err));
        std::process::exit(code);
    }
}

fn init_tracing(verbosity: u8) {
    let filter = match verbosity {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter)),
        )
        .with_target(false)
        .init();
}

async fn run(cli: Cli) -> Result<(), CliError> {
    let session = Session::new(build_config(&cli.global));
    let target = cli.global.target.clone();

    session
        .login(&target, build_login(&cli.global)?)
        .await
        .map_err(|e| CliError::from_api(&target, e))?;

    let result = match cli.command {
        CliCommand::Execute(args) => execute(&session, &target, args).await,
    };

    // best-effort teardown; the command's result wins
    if let Err(e) = session.logout(&target).await {
        tracing::debug!(error = %e, "logout failed");
    }

    result
}

async fn execute(session: &Session, target: &str, args: ExecuteArgs) -> Result<(), CliError> {
    let mut commands: Vec<Command> = eapi::normalize(args.commands);
    if let Some(secret) = &args.enable {
        commands = eapi::enable(commands, secret);
    }

    let opts = CallOptions {
        encoding: Some(args.encoding),
        ..CallOptions::default()
    };

    let response = session
        .call(target, commands, opts)
        .await
        .map_err(|e| CliError::from_api(target, e))?;

    if args.json {
        println!("{}", serde_json::to_string_pretty(&response.to_value()).unwrap_or_default());
    } else {
        print!("{response}");
    }

    if response.errored() {
        return Err(CliError::CommandFailed {
            code: response.code,
            message: response.message,
        });
    }

    Ok(())
}

fn build_config(global: &GlobalOpts) -> SessionConfig {
    let mut config = SessionConfig::new().timeouts(
        std::time::Duration::from_secs(5),
        std::time::Duration::from_secs(global.timeout),
    );

    if global.insecure {
        config = config.tls(TlsMode::DangerAcceptInvalid);
    }

    config
}

fn build_login(global: &GlobalOpts) -> Result<LoginOptions, CliError> {
    if let Some(cert) = &global.cert {
        return Ok(LoginOptions {
            certificate: Some(cert.clone()),
            ..LoginOptions::default()
        });
    }

    let password = if global.prompt {
        rpassword::prompt_password("password: ")
            .map_err(|e| CliError::PasswordPrompt { source: e })?
    } else {
        global.password.clone()
    };

    Ok(LoginOptions::credentials(&global.username, password))
}
