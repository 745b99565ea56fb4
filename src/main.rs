use std::io;
use std::path::PathBuf;
use std::process::ExitCode;

use clap::Parser;
use env_logger::Env;
use log::{error, info};

use nodelinks::interfaces::harvest::harvest_live;
use nodelinks::output::{FileSink, WriterSink};
use nodelinks::settings::is_valid_backoff_factor;
use nodelinks::{HarvestError, HarvestReport, Settings};

/// Fetch proxy node configurations and print them as vmess/vless share links
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Output file for the links, truncated at start (default: stdout)
    #[arg(short, long, value_name = "FILE")]
    output: Option<PathBuf>,

    /// Retries per node config after the first failed attempt
    #[arg(long, value_name = "N")]
    max_retries: Option<u32>,

    /// Base of the exponential backoff between retries, in seconds
    #[arg(long, value_name = "FACTOR", value_parser = parse_backoff_factor)]
    backoff_factor: Option<f64>,

    /// Serve the links over HTTP instead of running once
    #[arg(long)]
    serve: bool,

    /// Listen address (e.g., 127.0.0.1 or 0.0.0.0)
    #[arg(short, long, value_name = "ADDRESS")]
    address: Option<String>,

    /// Listen port
    #[arg(short, long, value_name = "PORT")]
    port: Option<u16>,
}

fn parse_backoff_factor(value: &str) -> Result<f64, String> {
    let factor: f64 = value
        .trim()
        .parse()
        .map_err(|_| format!("{:?} is not a number", value))?;
    if is_valid_backoff_factor(factor) {
        Ok(factor)
    } else {
        Err(format!("{} must be a finite number greater than 0", value))
    }
}

impl Args {
    fn apply(&self, settings: &mut Settings) {
        if let Some(output) = &self.output {
            settings.output = Some(output.clone());
        }
        if let Some(max_retries) = self.max_retries {
            settings.retry.max_retries = max_retries;
        }
        if let Some(factor) = self.backoff_factor {
            settings.retry.backoff_factor = factor;
        }
        if let Some(address) = &self.address {
            settings.listen_address = address.clone();
        }
        if let Some(port) = self.port {
            settings.listen_port = port;
        }
    }
}

fn run_once(settings: &Settings) -> Result<HarvestReport, HarvestError> {
    match &settings.output {
        Some(path) => {
            info!("Writing links to {}", path.display());
            let mut sink = FileSink::create(path)?;
            harvest_live(settings, &mut sink)
        }
        None => {
            let stdout = io::stdout();
            let mut sink = WriterSink::new(stdout.lock());
            harvest_live(settings, &mut sink)
        }
    }
}

#[cfg(feature = "web-api")]
fn serve(settings: Settings) -> ExitCode {
    use actix_web::{web, App, HttpServer};
    use nodelinks::models::AppState;
    use nodelinks::web_handlers;

    let listen_address = settings.listen_addr();
    let state = web::Data::new(AppState::new(settings));
    info!("nodelinks starting on {}", listen_address);

    let result = actix_web::rt::System::new().block_on(async move {
        HttpServer::new(move || {
            App::new()
                .app_data(state.clone())
                .configure(web_handlers::config)
        })
        .bind(listen_address)?
        .run()
        .await
    });
    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!("Web server failed: {}", e);
            ExitCode::FAILURE
        }
    }
}

#[cfg(not(feature = "web-api"))]
fn serve(_settings: Settings) -> ExitCode {
    error!("--serve needs a build with the web-api feature");
    ExitCode::FAILURE
}

fn main() -> ExitCode {
    // Logs go to stderr so stdout carries only links
    env_logger::init_from_env(Env::default().default_filter_or("info"));

    let args = Args::parse();

    let mut settings = match Settings::from_env() {
        Ok(settings) => settings,
        Err(e) => {
            error!("{}", e);
            return ExitCode::FAILURE;
        }
    };
    args.apply(&mut settings);

    if args.serve {
        return serve(settings);
    }

    match run_once(&settings) {
        Ok(report) => {
            info!("Produced {} links", report.emitted);
            ExitCode::SUCCESS
        }
        Err(e) => {
            error!("{}", e);
            ExitCode::FAILURE
        }
    }
}
