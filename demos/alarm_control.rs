//! Temperature alarm control example
//!
//! Demonstrates the alarm and device control features:
//! - Setting target and range alarms
//! - Reading alarms back
//! - Switching units and the audible alarm
//! - Snoozing a sounding alarm
//!
//! Run with: cargo run --example alarm_control -- --address AA:BB:CC:DD:EE:FF
//!
//! Other options:
//!   --name <advertised name>   find the device by name instead of address
//!   --model TP904              use the 2-probe profile (default TP902)
//!   --channel <n>              probe channel to configure (default 1)

use std::time::Duration;
use tp90x::{
    AlarmSetting, BleTransport, ConnectOptions, DeviceProfile, Error, Result, SearchMode,
    Session, Units,
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

    println!("TP90x Alarm Control");
    println!("===================\n");

    let args: Vec<String> = std::env::args().collect();
    let (identifier, search_mode) = match (flag(&args, "--address"), flag(&args, "--name")) {
        (Some(address), _) => (address, SearchMode::Address),
        (None, Some(name)) => (name, SearchMode::Name),
        (None, None) => {
            eprintln!(
                "Usage: alarm_control (--address <addr> | --name <name>) [--model TP902|TP904] [--channel <n>]"
            );
            return Ok(());
        }
    };

    let model = flag(&args, "--model").unwrap_or_else(|| "TP902".to_string());
    let profile = DeviceProfile::from_model(&model).ok_or_else(|| Error::InvalidParameter {
        name: "model".to_string(),
        value: model.clone(),
    })?;

    let channel = match flag(&args, "--channel") {
        Some(value) => value.parse::<u8>().map_err(|_| Error::InvalidParameter {
            name: "channel".to_string(),
            value,
        })?,
        None => 1,
    };
    // Reject a bad channel before connecting
    profile.validate_channel(channel)?;

    let options = ConnectOptions::default().with_search_mode(search_mode);
    let transport = BleTransport::connect(&identifier, &options)?;
    let mut session = Session::new(transport, profile);

    let timeout = Duration::from_secs(5);
    if session.authenticate(timeout)?.is_none() {
        println!("Auth timeout!");
        return Ok(());
    }

    println!("=== Target Alarm ===");
    session.set_alarm(channel, AlarmSetting::Target(74.0))?;
    print_alarm(&mut session, channel, timeout)?;

    println!("\n=== Range Alarm ===");
    session.set_alarm(
        channel,
        AlarmSetting::Range {
            high: 120.5,
            low: -5.0,
        },
    )?;
    print_alarm(&mut session, channel, timeout)?;

    println!("\n=== Units and Sound ===");
    session.set_units(Units::Fahrenheit)?;
    session.set_sound_alarm(false)?;
    if let Some(status) = session.get_status(timeout)? {
        println!("{}", status);
    }

    session.set_units(Units::Celsius)?;
    session.set_sound_alarm(true)?;
    if let Some(status) = session.get_status(timeout)? {
        println!("{}", status);
    }

    println!("\n=== Cleanup ===");
    session.snooze_alarm()?;
    session.set_alarm(channel, AlarmSetting::Off)?;
    print_alarm(&mut session, channel, timeout)?;

    session.backlight_on()?;
    session.into_transport().disconnect()?;

    println!("\nDone.");
    Ok(())
}

fn print_alarm(session: &mut Session<BleTransport>, channel: u8, timeout: Duration) -> Result<()> {
    match session.get_alarm(channel, timeout)? {
        Some(alarm) => println!("{}", alarm),
        None => println!("Alarm(ch{}) timeout", channel),
    }
    Ok(())
}
