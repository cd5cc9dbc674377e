//! Simulated TSADC behind a serial link
//!
//! Runs the engine on a simulated register window and serves the control
//! protocol on a serial port, so `tsadc_host` has a device to talk to. A
//! background thread sweeps every channel between the coldest and hottest
//! calibration codes and raises the channel's interrupt when a sweep climbs
//! through an armed comparator.
//!
//! ## Usage
//!
//! ```bash
//! # A pair of linked pseudo terminals
//! socat -d -d pty,raw,echo=0 pty,raw,echo=0
//!
//! cargo run --features std --example sim_device -- --port /dev/pts/3
//! cargo run --features std --bin tsadc_host -- --port /dev/pts/4
//! ```

use std::thread;
use std::time::Duration;

use tsadc::blocking::block_on;
use tsadc::regs;
use tsadc::{
    CalibrationTable, ChannelId, CharDevice, Config, ControlService, SimRegisters, StreamLink,
    Tsadc,
};

/// Time between two simulated conversions
const CONVERSION_INTERVAL: Duration = Duration::from_millis(100);

/// Code change per conversion
const SWEEP_STEP: u32 = 3;

fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::Builder::new()
        .filter_module("tsadc", log::LevelFilter::Info)
        .init();

    let args: Vec<String> = std::env::args().collect();
    let port_name = args
        .iter()
        .position(|a| a == "--port")
        .and_then(|idx| args.get(idx + 1))
        .ok_or("Usage: sim_device --port <PORT>")?;

    let table = CalibrationTable::RK3588;
    let config = Config::new(0xfec0_0000, regs::REGISTER_SPAN, 0, ChannelId::DEFAULT);
    let device = Tsadc::new(SimRegisters::new(), table, config.channel);
    device.start(&config);

    // Idle read timeouts are retried by the link.
    let port = serialport::new(port_name.as_str(), 115200)
        .timeout(Duration::from_secs(1))
        .open()?;
    println!("Serving on {}", port_name);

    let served = thread::scope(|s| {
        s.spawn(|| sweep(&device, table));

        let mut service = ControlService::new(CharDevice::new(&device).open());
        let mut link = StreamLink::new(port);
        let served = block_on(service.serve(&mut link));
        device.shutdown();
        served
    });

    served.map_err(|e| format!("link error: {:?}", e).into())
}

/// Drive the simulated conversions until the device shuts down
fn sweep(device: &Tsadc<SimRegisters>, table: CalibrationTable) {
    let floor = table.coldest().code as u32;
    let span = table.hottest().code as u32 - floor;
    let sim = device.registers();
    let layout = device.layout();

    // Position on a triangle wave of period 2 * span, staggered per channel.
    let mut position = [0u32; regs::MAX_CHANNELS];
    for id in ChannelId::all() {
        position[id.index()] = span / regs::MAX_CHANNELS as u32 * id.index() as u32;
    }
    let code_at = |pos: u32| floor + if pos <= span { pos } else { 2 * span - pos };

    while !device.is_shut_down() {
        let mut raised = 0;
        for id in ChannelId::all() {
            let chn = id.index();
            let previous = code_at(position[chn]);
            position[chn] = (position[chn] + SWEEP_STEP) % (2 * span);
            let code = code_at(position[chn]);
            sim.set_code_at(layout, id, code);

            let armed = sim.peek(regs::INT_EN) & regs::int_src_en(chn) != 0;
            let comparator = sim.peek(layout.comp_int(chn));
            if armed && previous < comparator && code >= comparator {
                raised |= regs::int_src_mask(chn);
            }
        }

        // Stands in for the interrupt line.
        if raised != 0 {
            sim.raise(raised);
            device.on_interrupt();
        }
        thread::sleep(CONVERSION_INTERVAL);
    }
}
