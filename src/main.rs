use certnotify::{Config, Notifier, Report, TlsChecker};
use chrono::Local;
use clap::Parser;
use log::info;
use std::error::Error;
use std::ffi::OsString;
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Proxy address for the Telegram request, empty for a direct connection
    #[arg(long, default_value = "")]
    proxy: String,

    /// Path to a TOML configuration file
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Read certificates without verifying them, so expired ones get a date
    #[arg(long)]
    insecure: bool,

    /// Print an example configuration file and exit
    #[arg(long)]
    generate_config: bool,
}

/// Accepts the single-dash `-proxy` spelling used by existing crontabs.
fn go_style_args<I: IntoIterator<Item = OsString>>(args: I) -> Vec<OsString> {
    args.into_iter()
        .map(|arg| match arg.to_str() {
            Some("-proxy") => OsString::from("--proxy"),
            Some(s) if s.starts_with("-proxy=") => OsString::from(format!("-{}", s)),
            _ => arg,
        })
        .collect()
}

fn run(args: Args) -> Result<(), Box<dyn Error>> {
    let mut config = Config::packaged()?;
    if let Some(path) = &args.config {
        config = config.merge_with(Config::from_file(path)?);
    }
    let settings = config
        .merge_with(Config::from_cli_args(Some(args.proxy), args.insecure))
        .resolve()?;

    let checker = if settings.verify_certificates {
        TlsChecker::new()?
    } else {
        TlsChecker::insecure()?
    };
    info!("checking {} hosts", settings.hosts.len());
    let report = Report::build(&settings.hosts, Local::now(), &checker);

    let notifier = Notifier::new(&settings.bot, settings.proxy.as_deref())?;
    notifier.send(&report)?;
    Ok(())
}

fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let args = Args::parse_from(go_style_args(std::env::args_os()));
    if args.generate_config {
        println!("{}", Config::example_toml());
        return;
    }

    if let Err(e) = run(args) {
        println!("{}", e);
    }
}
