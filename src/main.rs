// src/main.rs
use std::path::PathBuf;

use clap::{Parser, Subcommand};
use shadowguard_client::scan::load_inventory;
use shadowguard_client::types::UpdateProfileRequest;
use shadowguard_client::validation::SignupForm;
use shadowguard_client::{ClientConfig, Session, SqliteStore};
use tracing::info;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "shadowguard", version, about = "ShadowGuard device security client")]
struct Cli {
    /// Platform device identifier (e.g. the Android ID).
    #[arg(long, global = true, env = "SHADOWGUARD_DEVICE_ID")]
    device_id: Option<String>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Decide the entry screen from stored state.
    Bootstrap,
    Login {
        #[arg(long)]
        email: String,
        #[arg(long)]
        password: String,
    },
    Signup {
        #[arg(long)]
        name: String,
        #[arg(long)]
        surname: String,
        #[arg(long)]
        email: String,
        #[arg(long, default_value = "")]
        phone: String,
        #[arg(long)]
        password: String,
        #[arg(long)]
        confirm_password: String,
    },
    ForgotPassword {
        #[arg(long)]
        email: String,
    },
    VerifyOtp {
        #[arg(long)]
        email: String,
        #[arg(long)]
        otp: String,
    },
    ResetPassword {
        #[arg(long)]
        email: String,
        #[arg(long)]
        reset_token: String,
        #[arg(long)]
        new_password: String,
        #[arg(long)]
        confirm_password: String,
    },
    Logout,
    Whoami,
    UpdateProfile {
        #[arg(long)]
        name: Option<String>,
        #[arg(long)]
        surname: Option<String>,
        #[arg(long)]
        phone: Option<String>,
    },
    RegisterDevice {
        #[arg(long)]
        os_version: String,
        #[arg(long)]
        device_model: String,
    },
    DeviceStatus,
    /// Show the backend record for `--device-id`.
    Device,
    /// Upload an installed-app inventory (JSON array of packages).
    Scan {
        #[arg(long)]
        apps: PathBuf,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = ClientConfig::from_env();
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let cli = Cli::parse();
    let store = SqliteStore::open(&config.database_url).await?;
    let session = Session::new(&config, store)?;
    info!("using backend {}", session.api().base_url());

    let device_id = cli.device_id.as_deref();

    match cli.command {
        Command::Bootstrap => {
            let target = session.bootstrap(device_id).await;
            println!("{target}");
        }
        Command::Login { email, password } => {
            let outcome = session.login(&email, &password, device_id).await?;
            println!("logged in as {}", outcome.user.email);
            println!("{}", outcome.target);
        }
        Command::Signup {
            name,
            surname,
            email,
            phone,
            password,
            confirm_password,
        } => {
            let form = SignupForm {
                name,
                surname,
                email,
                phone,
                password,
                confirm_password,
            };
            let res = session.signup(&form).await?;
            println!("account created for {}, please log in", res.email);
        }
        Command::ForgotPassword { email } => {
            println!("{}", session.forgot_password(&email).await?);
        }
        Command::VerifyOtp { email, otp } => {
            let reset_token = session.verify_otp(&email, &otp).await?;
            println!("code accepted, reset token: {reset_token}");
        }
        Command::ResetPassword {
            email,
            reset_token,
            new_password,
            confirm_password,
        } => {
            let msg = session
                .reset_password(&email, &reset_token, &new_password, &confirm_password)
                .await?;
            println!("{msg}");
        }
        Command::Logout => {
            session.logout().await?;
            println!("logged out");
        }
        Command::Whoami => {
            let user = session.current_user().await?;
            println!("{}", serde_json::to_string_pretty(&user)?);
        }
        Command::UpdateProfile {
            name,
            surname,
            phone,
        } => {
            let user = session
                .update_profile(&UpdateProfileRequest {
                    name,
                    surname,
                    phone,
                })
                .await?;
            println!("profile updated for {}", user.email);
        }
        Command::RegisterDevice {
            os_version,
            device_model,
        } => {
            let id = device_id.ok_or_else(|| anyhow::anyhow!("--device-id is required"))?;
            let dev = session.register_device(id, &os_version, &device_model).await?;
            if dev.already_registered {
                println!("device {} already registered", dev.device_identifier);
            } else {
                println!("device {} registered", dev.device_identifier);
            }
        }
        Command::DeviceStatus => {
            let status = session.device_status().await?;
            println!(
                "registered: {}, devices: {}",
                status.is_device_registered, status.device_count
            );
            for d in status.devices {
                println!(
                    "  {} {} ({}) last risk {}",
                    d.device_identifier.as_deref().unwrap_or(&d.id),
                    d.device_model,
                    d.os_version,
                    d.last_risk_score.map(|s| s.to_string()).unwrap_or_else(|| "-".into())
                );
            }
        }
        Command::Device => {
            let id = device_id.ok_or_else(|| anyhow::anyhow!("--device-id is required"))?;
            let dev = session.device(id).await?;
            println!("{}", serde_json::to_string_pretty(&dev)?);
        }
        Command::Scan { apps } => {
            let inventory = load_inventory(&apps)?;
            let summary = session.upload_scan(inventory).await?;
            println!("{}", serde_json::to_string_pretty(&summary)?);
        }
    }
    Ok(())
}
