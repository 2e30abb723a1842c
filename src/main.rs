mod cli;

use repitch::config;
use repitch::job::{Job, JobEvent, JobOutcome, JobSpec};
use repitch::pipeline::Pipelines;
use repitch_common::{MediaKind, PitchUnit, MAX_SHIFT_SEMITONES};

use anyhow::Result;
use clap::Parser;
use cli::{Cli, Commands, SampleRateArg};
use std::path::{Path, PathBuf};

fn main() -> Result<()> {
    let cli = Cli::parse();

    // Respect RUST_LOG env var if set, otherwise use defaults based on verbose flag
    let env_filter = std::env::var("RUST_LOG").unwrap_or_else(|_| {
        if cli.verbose {
            "repitch=trace,repitch_av=trace,repitch_dsp=debug".to_string()
        } else {
            "repitch=info,repitch_av=info,repitch_dsp=warn".to_string()
        }
    });

    tracing_subscriber::fmt()
        .with_env_filter(&env_filter)
        .with_writer(std::io::stderr)
        .init();

    match cli.command {
        Commands::Shift {
            input,
            output,
            shift,
            unit,
            sample_rate,
            json,
        } => shift_file(
            ShiftArgs {
                input,
                output,
                amount: shift,
                unit,
                sample_rate,
                json,
            },
            cli.config.as_deref(),
        ),
        Commands::CheckTools => check_tools(cli.config.as_deref()),
        Commands::Validate {
            config: config_path,
        } => {
            let path = config_path.or(cli.config);
            validate_config(path.as_deref())
        }
        Commands::Version => {
            println!("repitch {}", env!("CARGO_PKG_VERSION"));
            Ok(())
        }
    }
}

struct ShiftArgs {
    input: PathBuf,
    output: Option<PathBuf>,
    amount: f64,
    unit: Option<PitchUnit>,
    sample_rate: Option<SampleRateArg>,
    json: bool,
}

fn shift_file(args: ShiftArgs, config_path: Option<&Path>) -> Result<()> {
    let config = config::load_config_or_default(config_path)?;

    let unit = args.unit.unwrap_or(config.defaults.unit);
    let semitones = unit.to_semitones(args.amount);
    if !semitones.is_finite() || semitones.abs() > MAX_SHIFT_SEMITONES {
        anyhow::bail!(
            "Shift must be within ±{} semitones, got {} {}",
            MAX_SHIFT_SEMITONES,
            args.amount,
            unit
        );
    }

    if !args.input.exists() {
        anyhow::bail!("Input file does not exist: {:?}", args.input);
    }
    if MediaKind::classify(&args.input).is_none() {
        anyhow::bail!("Unsupported input format: {:?}", args.input);
    }

    let sample_rate = match args.sample_rate {
        Some(choice) => choice.as_option(),
        None => config.defaults.sample_rate,
    };
    let output = args
        .output
        .unwrap_or_else(|| JobSpec::suggest_output_path(&args.input, args.amount, unit));

    let spec = JobSpec::new(&args.input, output, semitones).with_sample_rate(sample_rate);
    let pipelines = Pipelines::from_config(&config)?;
    let job = Job::new(spec, pipelines).with_temp_root(config.workspace.temp_root.clone());

    let rt = tokio::runtime::Runtime::new()?;
    let outcome = rt.block_on(watch_job(job, args.json))?;

    match outcome {
        JobOutcome::Succeeded(path) => {
            if !args.json {
                println!("\nOutput: {}", path.display());
            }
            Ok(())
        }
        JobOutcome::Failed(failure) => anyhow::bail!("{}", failure),
        JobOutcome::Cancelled => anyhow::bail!("Job cancelled"),
    }
}

/// Print events until the job ends; Ctrl-C cancels at the next stage boundary.
async fn watch_job(job: Job, json: bool) -> Result<JobOutcome> {
    let mut handle = job.spawn();
    let cancel = handle.cancel_token();
    let mut cancel_requested = false;

    loop {
        tokio::select! {
            event = handle.next_event() => match event {
                Some(event) => print_event(&event, json)?,
                None => break,
            },
            _ = tokio::signal::ctrl_c(), if !cancel_requested => {
                eprintln!("Cancelling after the current stage...");
                cancel.cancel();
                cancel_requested = true;
            }
        }
    }

    Ok(handle.wait().await)
}

fn print_event(event: &JobEvent, json: bool) -> Result<()> {
    if json {
        println!("{}", serde_json::to_string(event)?);
        return Ok(());
    }

    match event {
        JobEvent::Started => println!("Processing..."),
        JobEvent::Progress { percent, step } => println!("[{:>3}%] {}", percent, step),
        JobEvent::Succeeded { .. } | JobEvent::Failed(_) | JobEvent::Cancelled => {}
    }
    Ok(())
}

fn check_tools(config_path: Option<&Path>) -> Result<()> {
    println!("Checking external tools...\n");

    let config = config::load_config_or_default(config_path)?;
    let ffmpeg = config.resolve_ffmpeg();
    let tools = repitch_av::check_tools(&ffmpeg);
    let mut all_ok = true;

    for tool in &tools {
        let status = if tool.available {
            "✓"
        } else {
            // ffprobe is informational only.
            if tool.name != "ffprobe" {
                all_ok = false;
            }
            "✗"
        };

        print!("{} {}", status, tool.name);

        if let Some(ref version) = tool.version {
            print!(" ({})", version.lines().next().unwrap_or(""));
        }

        if let Some(ref path) = tool.path {
            print!(" - {}", path.display());
        }

        println!();
    }

    println!("\nffmpeg used for jobs: {}", ffmpeg.display());

    println!();
    if all_ok {
        println!("All required tools are available!");
    } else {
        println!(
            "{} is not usable. Video files and MP3 output will fail until ffmpeg is installed or configured.",
            ffmpeg.display()
        );
    }

    Ok(())
}

fn validate_config(path: Option<&Path>) -> Result<()> {
    let config = match path {
        Some(p) => {
            println!("Validating config: {:?}", p);
            let config = config::load_config(p)?;
            println!("✓ Configuration is valid");
            config
        }
        None => {
            println!("No config file specified, using defaults");
            config::Config::default()
        }
    };

    println!(
        "  Vocoder: fft_size {}, hop_length {}",
        config.vocoder.fft_size, config.vocoder.hop_length
    );
    println!("  MP3 bitrate: {}", config.audio.mp3_bitrate);
    println!(
        "  Mux audio: {} @ {}",
        config.audio.mux_audio_codec, config.audio.mux_audio_bitrate
    );
    println!("  Default unit: {}", config.defaults.unit);
    match config.defaults.sample_rate {
        Some(rate) => println!("  Default sample rate: {} Hz", rate),
        None => println!("  Default sample rate: keep original"),
    }
    if let Some(ref ffmpeg) = config.tools.ffmpeg_path {
        println!("  ffmpeg path: {}", ffmpeg.display());
    }

    Ok(())
}
