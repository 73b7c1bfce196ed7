//! Requests one assertion from an authenticator and verifies it against a
//! credential public key.

use std::path::PathBuf;
use std::process::ExitCode;

use clap::Parser;
use fido2_assert::{
    AssertionSettings, CoordinationError, CoseAlgorithm, Stage, VirtualAuthenticator, read_blob,
    run_assertion_with_key_file,
};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser, Debug)]
#[command(name = "demo-assert")]
#[command(version, about = "Get and verify a FIDO2 assertion", long_about = None)]
struct Cli {
    /// Signature algorithm: es256 (ecdsa) or rs256 (rsa)
    #[arg(short = 't', value_name = "TYPE", default_value = "es256")]
    algorithm: String,

    /// File holding a credential id to allow (repeatable)
    #[arg(short = 'a', value_name = "CRED_ID_FILE")]
    allow: Vec<PathBuf>,

    /// PIN to unlock user verification
    #[arg(short = 'P', value_name = "PIN")]
    pin: Option<String>,

    /// Require user presence
    #[arg(short = 'p')]
    user_presence: bool,

    /// Require user verification
    #[arg(short = 'v')]
    user_verification: bool,

    /// Talk to the device over the legacy U2F profile
    #[arg(short = 'u')]
    u2f: bool,

    /// Check rpIdHash and UP/UV flags in the authenticator data
    #[arg(long)]
    strict: bool,

    /// Credential public key (PEM or DER SubjectPublicKeyInfo)
    #[arg(value_name = "PUBKEY")]
    pubkey: PathBuf,

    /// Device description file
    #[arg(value_name = "DEVICE")]
    device: String,
}

fn init_tracing(app_name: &str) {
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        #[cfg(debug_assertions)]
        {
            format!("fido2_assert=debug,{}=debug,info", app_name).into()
        }

        #[cfg(not(debug_assertions))]
        {
            "info".into()
        }
    });

    tracing_subscriber::registry()
        .with(env_filter)
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();
}

fn settings_from_cli(cli: &Cli) -> Result<AssertionSettings, CoordinationError> {
    let algorithm = cli
        .algorithm
        .parse::<CoseAlgorithm>()
        .map_err(|e| CoordinationError::Input {
            stage: Stage::SelectAlgorithm,
            message: e.to_string(),
        })?;

    let allowed_credentials = cli
        .allow
        .iter()
        .map(|path| {
            read_blob(path).map_err(|e| CoordinationError::Input {
                stage: Stage::ReadCredentialId,
                message: e.to_string(),
            })
        })
        .collect::<Result<Vec<_>, _>>()?;

    Ok(AssertionSettings {
        algorithm,
        allowed_credentials,
        user_presence: cli.user_presence,
        user_verification: cli.user_verification,
        pin: cli.pin.clone(),
        force_u2f: cli.u2f,
        strict: cli.strict,
        ..AssertionSettings::from_env()
    })
}

fn run(cli: &Cli) -> Result<(), CoordinationError> {
    let settings = settings_from_cli(cli)?;
    let entry =
        run_assertion_with_key_file(&VirtualAuthenticator, &cli.pubkey, &cli.device, &settings)?;
    tracing::debug!(
        "Verified signature of {} bytes over {} bytes of authenticator data",
        entry.signature().len(),
        entry.authenticator_data().len()
    );
    Ok(())
}

fn main() -> ExitCode {
    dotenvy::dotenv().ok();
    init_tracing("demo_assert");

    let cli = Cli::parse();
    match run(&cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            let e = e.log();
            eprintln!("{}", e.diagnostic());
            ExitCode::FAILURE
        }
    }
}
