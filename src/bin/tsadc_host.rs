//! TSADC Host CLI
//!
//! Interactive shell driving a TSADC control service over a serial link,
//! for instance the `sim_device` demo.
//!
//! ```bash
//! cargo run --features std --bin tsadc_host -- --list-ports
//! cargo run --features std --bin tsadc_host -- --port /dev/ttyUSB0
//! ```
//!
//! Without `--port` the first USB serial port is used.

use std::io::{self, BufRead, Read, Write};
use std::time::Duration;

use serialport::{ClearBuffer, SerialPort, SerialPortType};
use tsadc::protocol::{self, Command, Response, MAX_FRAME_SIZE};

type Port = Box<dyn SerialPort>;

const HELP: &str = "\
Commands:
  channel [id]            select the active channel, or show it
  threshold <celsius>     arm a threshold on the active channel
  read [n] [interval_ms]  sample the active channel n times
  wait                    block until the active channel crosses its threshold
  exit";

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args: Vec<String> = std::env::args().collect();
    let ports = serialport::available_ports()?;

    if args.iter().any(|a| a == "--list-ports") {
        for port in &ports {
            println!("{}", port.port_name);
        }
        return Ok(());
    }

    let port_name = match args.iter().position(|a| a == "--port") {
        Some(idx) => args.get(idx + 1).cloned(),
        None => ports
            .into_iter()
            .find(|p| matches!(p.port_type, SerialPortType::UsbPort(_)))
            .map(|p| p.port_name),
    }
    .ok_or("no serial port, pass --port <PORT>")?;

    // `wait` can take arbitrarily long.
    let mut port = serialport::new(&port_name, 115200)
        .timeout(Duration::from_secs(3600))
        .open()?;

    // Drop the ready frame the service sent before we opened the port.
    std::thread::sleep(Duration::from_millis(100));
    port.clear(ClearBuffer::Input)?;
    println!("Connected to {}. {}", port_name, HELP);

    let stdin = io::stdin();
    loop {
        print!("> ");
        io::stdout().flush()?;
        let mut line = String::new();
        if stdin.lock().read_line(&mut line)? == 0 {
            break;
        }

        let words: Vec<&str> = line.split_whitespace().collect();
        let result = match words.as_slice() {
            [] => Ok(()),
            ["exit" | "quit"] => break,
            ["help"] => {
                println!("{}", HELP);
                Ok(())
            }
            ["channel" | "ch"] => transact(&mut port, Command::get_channel()),
            ["channel" | "ch", id] => {
                parse(id).and_then(|id| transact(&mut port, Command::set_channel(id)))
            }
            ["threshold" | "th", celsius] => {
                parse(celsius).and_then(|c| transact(&mut port, Command::set_int_threshold(c)))
            }
            ["read" | "r", rest @ ..] if rest.len() <= 2 => {
                let count = rest.first().map_or(Ok(1), |n| parse::<u32>(n));
                let interval = rest.get(1).map_or(Ok(1000), |ms| parse::<u64>(ms));
                count.and_then(|count| {
                    let interval = Duration::from_millis(interval?);
                    for i in 0..count {
                        if i > 0 {
                            std::thread::sleep(interval);
                        }
                        transact(&mut port, Command::read_temperature())?;
                    }
                    Ok(())
                })
            }
            ["wait" | "w"] => {
                println!("Waiting for a threshold crossing...");
                transact(&mut port, Command::wait_event())
            }
            _ => Err(format!("unknown command '{}', try 'help'", line.trim()).into()),
        };

        if let Err(e) = result {
            eprintln!("Error: {}", e);
        }
    }
    Ok(())
}

fn parse<T: std::str::FromStr>(word: &str) -> Result<T, Box<dyn std::error::Error>> {
    word.parse()
        .map_err(|_| format!("'{}' is not a valid number", word).into())
}

/// Send one command and print the response
fn transact(port: &mut Port, command: Command) -> Result<(), Box<dyn std::error::Error>> {
    let mut buf = [0u8; MAX_FRAME_SIZE];
    port.write_all(protocol::encode(&command, &mut buf)?)?;
    port.flush()?;

    let mut frame = Vec::with_capacity(MAX_FRAME_SIZE);
    for byte in port.by_ref().bytes() {
        let byte = byte?;
        frame.push(byte);
        if byte == 0x00 {
            break;
        }
        if frame.len() == MAX_FRAME_SIZE {
            return Err("response frame too large".into());
        }
    }

    match protocol::decode::<Response>(&mut frame)? {
        Response::Ok => println!("ok"),
        Response::Channel { channel } => println!("channel {}", channel),
        Response::Temperature {
            channel,
            code,
            celsius,
        } => println!("channel {}: {} C (code {})", channel, celsius, code),
        Response::Event { channel } => println!("channel {}: threshold crossed", channel),
        Response::Error { error } => println!("device error: {}", error),
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_numbers() {
        assert_eq!(parse::<i32>("-40").unwrap(), -40);
        assert_eq!(parse::<u32>("10").unwrap(), 10);
        assert_eq!(
            parse::<u32>("ten").unwrap_err().to_string(),
            "'ten' is not a valid number"
        );
    }
}
