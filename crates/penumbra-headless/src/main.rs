use std::path::{Path, PathBuf};
use std::process;

use penumbra_core::settings::{load_settings_from_path, PassSettings};
use penumbra_headless::report::{self, RunReport};
use penumbra_headless::runner::{HeadlessRunner, RunOptions};
use penumbra_headless::{scenes, HeadlessError};

fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let args: Vec<String> = std::env::args().collect();

    let mut settings_path: Option<PathBuf> = None;
    let mut scene_name: Option<String> = None;
    let mut output_path: Option<PathBuf> = None;
    let mut options = RunOptions::default();

    let mut i = 1;
    while i < args.len() {
        let flag = args[i].as_str();
        if matches!(flag, "--help" | "-h") {
            print_usage();
            process::exit(0);
        }
        i += 1;
        let Some(value) = args.get(i) else {
            eprintln!("Missing value for {flag}");
            process::exit(1);
        };
        match flag {
            "--settings" => settings_path = Some(PathBuf::from(value)),
            "--scene" => scene_name = Some(value.clone()),
            "--output" => output_path = Some(PathBuf::from(value)),
            "--frames" => options.frames = parse_number(flag, value),
            "--width" => options.width = parse_number(flag, value),
            "--height" => options.height = parse_number(flag, value),
            other => {
                eprintln!("Unknown argument: {}", other);
                process::exit(1);
            }
        }
        i += 1;
    }

    if let Err(err) = run(settings_path.as_deref(), scene_name.as_deref(), output_path.as_deref(), options) {
        log::error!("{err}");
        process::exit(1);
    }
}

fn run(
    settings_path: Option<&Path>,
    scene_name: Option<&str>,
    output_path: Option<&Path>,
    options: RunOptions,
) -> Result<(), HeadlessError> {
    let settings = match settings_path {
        Some(path) => load_settings_from_path(path)?,
        None => PassSettings::default(),
    };
    let kernel_wgsl = settings
        .kernel_path
        .as_ref()
        .map(|path| {
            std::fs::read_to_string(path).map_err(|source| HeadlessError::KernelIo {
                path: path.clone(),
                source,
            })
        })
        .transpose()?;
    if kernel_wgsl.is_none() {
        log::warn!("No kernel_path in settings; the pass stays idle");
    }

    let scene_configs = match scene_name {
        Some(name) => vec![scenes::find_scene(name).ok_or_else(|| HeadlessError::UnknownScene(name.to_string()))?],
        None => scenes::standard_scenes(),
    };

    log::info!("Initializing GPU...");
    let runner = HeadlessRunner::new()?;

    let mut results = Vec::new();
    for config in &scene_configs {
        results.push(runner.run_scene(config, &settings, kernel_wgsl.as_deref(), options)?);
    }

    println!("\n## SDF Pass Results\n");
    println!("{}", report::format_markdown(&results));

    if let Some(path) = output_path {
        let run_report = RunReport {
            label: settings.label.clone(),
            kernel: settings.kernel_path.as_ref().map(|p| p.display().to_string()),
            results,
        };
        report::save_report(path, &run_report).map_err(|source| HeadlessError::Output {
            path: path.to_path_buf(),
            source,
        })?;
        log::info!("Saved report to {}", path.display());
    }

    log::info!("Headless run complete.");
    Ok(())
}

fn parse_number(flag: &str, value: &str) -> u32 {
    value.parse().unwrap_or_else(|_| {
        eprintln!("invalid {flag} value: {value}");
        process::exit(1);
    })
}

fn print_usage() {
    eprintln!("Usage: penumbra-headless [OPTIONS]");
    eprintln!("  --settings <path>   Pass settings RON (default: built-in, idle)");
    eprintln!("  --scene <name>      csg-demo, grid or empty (default: all)");
    eprintln!("  --frames <n>        Frames per scene (default: 60)");
    eprintln!("  --width <px>        Frame width (default: 640)");
    eprintln!("  --height <px>       Frame height (default: 480)");
    eprintln!("  --output <path>     Write the run report as JSON");
}
