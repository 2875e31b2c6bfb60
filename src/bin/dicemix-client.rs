//
// Copyright (c) 2019 Stegos AG
//
// Permission is hereby granted, free of charge, to any person obtaining a copy
// of this software and associated documentation files (the "Software"), to deal
// in the Software without restriction, including without limitation the rights
// to use, copy, modify, merge, publish, distribute, sublicense, and/or sell
// copies of the Software, and to permit persons to whom the Software is
// furnished to do so, subject to the following conditions:
//
// The above copyright notice and this permission notice shall be included in all
// copies or substantial portions of the Software.
//
// THE SOFTWARE IS PROVIDED "AS IS", WITHOUT WARRANTY OF ANY KIND, EXPRESS OR
// IMPLIED, INCLUDING BUT NOT LIMITED TO THE WARRANTIES OF MERCHANTABILITY,
// FITNESS FOR A PARTICULAR PURPOSE AND NONINFRINGEMENT. IN NO EVENT SHALL THE
// AUTHORS OR COPYRIGHT HOLDERS BE LIABLE FOR ANY CLAIM, DAMAGES OR OTHER
// LIABILITY, WHETHER IN AN ACTION OF CONTRACT, TORT OR OTHERWISE, ARISING FROM,
// OUT OF OR IN CONNECTION WITH THE SOFTWARE OR THE USE OR OTHER DEALINGS IN THE
// SOFTWARE.

use clap::{App, Arg, ArgMatches};
use dicemix::config::{self, Config, ConfigError};
use dicemix::consts;
use dicemix_client::{DiceMixClient, WebSocketTransport};
use dicemix_crypto::signature::SigningKeyPair;
use dirs;
use failure::{format_err, Error};
use log::*;
use log4rs::append::console::ConsoleAppender;
use log4rs::config::{Appender, Config as LogConfig, Logger, Root};
use log4rs::encode::pattern::PatternEncoder;
use log4rs::Handle as LogHandle;
use std::path::PathBuf;
use std::process;

fn load_configuration_file(args: &ArgMatches<'_>) -> Result<Config, Error> {
    // Use --config argument for configuration.
    if let Some(cfg_path) = args.value_of_os("config") {
        let cfg = config::from_file(cfg_path)?;
        return Ok(cfg);
    }

    // Use $PWD/dicemix.toml for configuration.
    match config::from_file(consts::CONFIG_FILE_NAME) {
        Ok(cfg) => return Ok(cfg),
        Err(ConfigError::NotFoundError) => {} // fall through.
        Err(e) => return Err(e.into()),
    }

    // Use ~/.config/dicemix.toml for configuration.
    let cfg_path = dirs::config_dir()
        .unwrap_or_else(|| PathBuf::from(r"."))
        .join(PathBuf::from(consts::CONFIG_FILE_NAME));
    match config::from_file(cfg_path) {
        Ok(cfg) => return Ok(cfg),
        Err(ConfigError::NotFoundError) => {} // fall through.
        Err(e) => return Err(e.into()),
    }

    Ok(Default::default())
}

fn load_configuration(args: &ArgMatches<'_>) -> Result<Config, Error> {
    let mut cfg = load_configuration_file(args)?;

    if let Some(relay) = args.value_of("relay") {
        cfg.client.relay_url = relay.to_string();
    }
    if let Some(messages) = args.value_of("messages") {
        cfg.client.num_msgs = messages
            .parse()
            .map_err(|e| format_err!("Invalid --messages '{}': {}", messages, e))?;
    }
    cfg.client.validate()?;

    Ok(cfg)
}

fn initialize_logger(cfg: &Config) -> Result<LogHandle, Error> {
    // Try to load log4rs config file
    let handle = match log4rs::load_config_file(
        PathBuf::from(&cfg.general.log4rs_config),
        Default::default(),
    ) {
        Ok(config) => log4rs::init_config(config)?,
        Err(e) => {
            println!("Failed to read log4rs config file: {}", e);
            let stdout = ConsoleAppender::builder()
                .encoder(Box::new(PatternEncoder::new(
                    "{d(%Y-%m-%d %H:%M:%S)(local)} [{t}] {h({l})} {M}: {m}{n}",
                )))
                .build();
            let config = LogConfig::builder()
                .appender(Appender::builder().build("stdout", Box::new(stdout)))
                .logger(Logger::builder().build("dicemix_client", LevelFilter::Debug))
                .build(Root::builder().appender("stdout").build(LevelFilter::Info))
                .expect("console logger should never fail");
            log4rs::init_config(config)?
        }
    };
    Ok(handle)
}

fn run() -> Result<(), Error> {
    let name = consts::APP_NAME;
    let version = env!("CARGO_PKG_VERSION");

    let args = App::new(name)
        .version(version)
        .author("Stegos AG <info@stegos.com>")
        .about("Takes part in an anonymous DiceMix message exchange.")
        .arg(
            Arg::with_name("config")
                .short("c")
                .long("config")
                .value_name("FILE")
                .help("Path to dicemix.toml configuration file")
                .takes_value(true),
        )
        .arg(
            Arg::with_name("relay")
                .short("r")
                .long("relay")
                .value_name("URL")
                .help("WebSocket endpoint of the relay, e.g. ws://localhost:8082/ws")
                .takes_value(true),
        )
        .arg(
            Arg::with_name("messages")
                .short("m")
                .long("messages")
                .value_name("N")
                .help("Number of messages to contribute")
                .takes_value(true),
        )
        .get_matches();

    // Parse configuration
    let cfg = load_configuration(&args)?;

    // Initialize logger
    let _log = initialize_logger(&cfg)?;

    // Print welcome message
    info!("{} {}", name, version);

    let ltkp = SigningKeyPair::generate();
    info!("Generated a long-term key: {:?}", ltkp);

    let mut client = DiceMixClient::new(cfg.client.clone(), ltkp)?;
    let mut transport =
        WebSocketTransport::connect(&cfg.client.relay_url, cfg.client.response_timeout())?;
    let report = client.run(&mut transport)?;

    info!(
        "Run complete: session={}, my_id={}, blame_rounds={}, confirmed={}",
        report.session_id, report.my_id, report.blame_rounds, report.confirmed
    );
    for (slot, msg) in report.messages.iter().enumerate() {
        info!("Slot {}: {}", slot, dicemix_crypto::utils::u8v_to_hexstr(msg));
    }
    Ok(())
}

fn main() {
    if let Err(e) = run() {
        println!("Failed with error: {}", e); // Logger can be not yet initialized.
        error!("{}", e);
        process::exit(1)
    };
}
