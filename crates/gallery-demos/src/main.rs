mod config;
mod demos;

use std::process::ExitCode;

use anyhow::Result;
use gallery_engine::device::{GpuInit, HeadlessGpu};
use gallery_engine::logging::{init_logging, LoggingConfig};
use gallery_engine::window::{Runtime, RuntimeConfig};
use gallery_engine::FailureNotice;
use winit::dpi::LogicalSize;

use config::{Command, DemoConfig, USAGE};
use demos::Gallery;

fn main() -> ExitCode {
    init_logging(LoggingConfig::default());

    match run() {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            log::error!("{err:#}");
            ExitCode::FAILURE
        }
    }
}

fn run() -> Result<()> {
    let config = match DemoConfig::from_args(std::env::args().skip(1)) {
        Ok(config) => config,
        Err(err) => {
            eprintln!("{USAGE}");
            return Err(err);
        }
    };

    match config.command {
        Command::Help => {
            println!("{USAGE}");
            Ok(())
        }
        Command::Probe => probe(),
        Command::Run(kind) => {
            let app = Gallery::new(kind, &config);
            let runtime = RuntimeConfig {
                title: app.title(),
                initial_size: LogicalSize::new(f64::from(config.width), f64::from(config.height)),
            };
            Runtime::run(runtime, GpuInit::default(), app)
        }
    }
}

/// Prints what adapter the demos would run on, without opening a window.
fn probe() -> Result<()> {
    let gpu = match pollster::block_on(HeadlessGpu::new(GpuInit::default())) {
        Ok(gpu) => gpu,
        Err(err) => {
            eprintln!("{}", FailureNotice::from_error(&err).message());
            return Err(err.into());
        }
    };

    let info = gpu.adapter_info();
    println!("adapter: {}", info.name);
    println!("backend: {:?}", info.backend);
    println!("type:    {:?}", info.device_type);
    println!("driver:  {} {}", info.driver, info.driver_info);

    let limits = gpu.device().limits();
    println!("max texture dimension 2d: {}", limits.max_texture_dimension_2d);
    println!(
        "max compute workgroups per dimension: {}",
        limits.max_compute_workgroups_per_dimension
    );
    Ok(())
}
