//! Temperature monitor example
//!
//! Connects to a thermometer, authenticates, prints device information and
//! then streams temperature broadcasts until interrupted.
//!
//! Run with: cargo run --example monitor -- --address AA:BB:CC:DD:EE:FF
//!
//! Other options:
//!   --name <advertised name>   find the device by name instead of address
//!   --model TP904              use the 2-probe profile (default TP902)

use std::time::Duration;
use tp90x::{
    BleTransport, ConnectOptions, DeviceProfile, Error, Result, SearchMode, Session,
};

fn flag(args: &[String], name: &str) -> Option<String> {
    args.iter()
        .position(|arg| arg == name)
        .and_then(|i| args.get(i + 1))
        .cloned()
}

fn main() -> Result<()> {
    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter("warn,tp90x=debug")
        .init();

    println!("TP90x Temperature Monitor");
    println!("=========================\n");

    let args: Vec<String> = std::env::args().collect();
    let (identifier, search_mode) = match (flag(&args, "--address"), flag(&args, "--name")) {
        (Some(address), _) => (address, SearchMode::Address),
        (None, Some(name)) => (name, SearchMode::Name),
        (None, None) => {
            eprintln!("Usage: monitor (--address <addr> | --name <name>) [--model TP902|TP904]");
            return Ok(());
        }
    };

    let model = flag(&args, "--model").unwrap_or_else(|| "TP902".to_string());
    let profile = DeviceProfile::from_model(&model).ok_or_else(|| Error::InvalidParameter {
        name: "model".to_string(),
        value: model.clone(),
    })?;

    println!("Looking for {} by {}...\n", identifier, search_mode);

    let options = ConnectOptions::default().with_search_mode(search_mode);
    let transport = BleTransport::connect(&identifier, &options)?;
    println!("Connected to {}\n", transport.address());

    let mut session = Session::new(transport, profile)
        .with_temperature_callback(|broadcast| println!("{}", broadcast));

    let timeout = Duration::from_secs(5);

    match session.authenticate(timeout)? {
        Some(auth) => println!("Authenticated: {}", auth),
        None => {
            println!("Auth timeout!");
            return Ok(());
        }
    }

    session.sync_time()?;

    if let Some(fw) = session.get_firmware_version(timeout)? {
        println!("Firmware: {}", fw);
    }

    if let Some(status) = session.get_status(timeout)? {
        println!("{}", status);
    }

    let channels: Vec<u8> = session.profile().channels().collect();
    for channel in channels {
        match session.get_alarm(channel, timeout)? {
            Some(alarm) => println!("{}", alarm),
            None => println!("Alarm(ch{}) timeout", channel),
        }
    }

    println!("\nStreaming temperatures (Ctrl+C to stop)...\n");

    loop {
        session.process(Duration::from_secs(1))?;
    }
}
