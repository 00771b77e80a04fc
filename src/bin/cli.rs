use anyhow::{bail, Context, Result};
use clipcam::permissions::check_permission_detailed;
use clipcam::{
    CaptureSession, ClipcamConfig, FileMediaLibrary, LogNotifier, PermissionProvider,
    PermissionState, RecordingLimits, StaticPermissions, SyntheticCamera, SystemPermissions,
};
use std::env;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

#[tokio::main]
async fn main() -> Result<()> {
    clipcam::init_logging();

    let args: Vec<String> = env::args().collect();
    if args.len() < 2 {
        eprintln!("Usage: clipcam-cli <permission|record|init-config> [args]");
        std::process::exit(1);
    }

    let command = &args[1];
    match command.as_str() {
        "permission" => cmd_permission(&args),
        "record" => cmd_record(&args).await,
        "init-config" => cmd_init_config(&args),
        _ => {
            eprintln!("Unknown command: {}", command);
            std::process::exit(1);
        }
    }
}

fn cmd_permission(args: &[String]) -> Result<()> {
    let info = check_permission_detailed();
    if args.contains(&"--json".to_string()) {
        println!("{}", serde_json::to_string(&info)?);
    } else {
        println!("{} ({})", info.status, info.message);
    }
    Ok(())
}

fn cmd_init_config(args: &[String]) -> Result<()> {
    let path = args
        .get(2)
        .map(PathBuf::from)
        .unwrap_or_else(ClipcamConfig::default_path);
    ClipcamConfig::default().save_to_file(&path)?;
    println!("Wrote {}", path.display());
    Ok(())
}

struct RecordArgs {
    duration: Option<u64>,
    max_size: Option<u64>,
    stop_after: Option<Duration>,
    save: bool,
    assume_granted: bool,
    config: Option<PathBuf>,
    json: bool,
}

fn parse_record_args(args: &[String]) -> Result<RecordArgs> {
    let mut parsed = RecordArgs {
        duration: None,
        max_size: None,
        stop_after: None,
        save: false,
        assume_granted: false,
        config: None,
        json: false,
    };

    let mut i = 2;
    while i < args.len() {
        let value = |i: usize| {
            args.get(i + 1)
                .with_context(|| format!("{} needs a value", args[i]))
        };
        match args[i].as_str() {
            "--duration" => {
                parsed.duration = Some(value(i)?.parse()?);
                i += 1;
            }
            "--max-size" => {
                parsed.max_size = Some(value(i)?.parse()?);
                i += 1;
            }
            "--stop-after" => {
                parsed.stop_after = Some(parse_stop_after(value(i)?)?);
                i += 1;
            }
            "--config" => {
                parsed.config = Some(PathBuf::from(value(i)?));
                i += 1;
            }
            "--save" => parsed.save = true,
            "--assume-granted" => parsed.assume_granted = true,
            "--json" => parsed.json = true,
            other => bail!("Unknown record option: {}", other),
        }
        i += 1;
    }
    Ok(parsed)
}

fn parse_stop_after(raw: &str) -> Result<Duration> {
    let secs: f64 = raw
        .parse()
        .with_context(|| format!("--stop-after expects seconds, got {:?}", raw))?;
    if !secs.is_finite() || secs < 0.0 {
        bail!("--stop-after must be a non-negative number of seconds, got {}", raw);
    }
    Duration::try_from_secs_f64(secs)
        .with_context(|| format!("--stop-after is out of range: {}", raw))
}

async fn cmd_record(args: &[String]) -> Result<()> {
    let opts = parse_record_args(args)?;

    let config = match &opts.config {
        Some(path) => ClipcamConfig::load_from_file(path)?,
        None => ClipcamConfig::load_or_default(),
    };

    let permissions: Arc<dyn PermissionProvider> = if opts.assume_granted {
        Arc::new(StaticPermissions::granted())
    } else {
        Arc::new(SystemPermissions)
    };

    let session = Arc::new(CaptureSession::from_config(
        &config,
        permissions,
        Arc::new(SyntheticCamera::from_config(&config.camera)),
        Arc::new(FileMediaLibrary::from_config(&config.storage)),
        Arc::new(LogNotifier),
    ));

    if session.check_permission().await != PermissionState::Granted
        && session.request_permission().await != PermissionState::Granted
    {
        bail!("Camera permission not granted (use --assume-granted to skip the check)");
    }

    let defaults = config.recording.limits();
    let limits = RecordingLimits::new(
        opts.duration.unwrap_or(defaults.max_duration.as_secs()),
        opts.max_size.unwrap_or(defaults.max_file_size_bytes),
    );

    let stopper = session.clone();
    // First Ctrl-C stops the recording; once nothing is recording it exits
    ctrlc::set_handler(move || match stopper.stop_recording() {
        Ok(()) => log::info!("Stopping recording"),
        Err(e) => {
            log::warn!("Interrupted ({}); exiting", e);
            std::process::exit(130);
        }
    })?;

    if let Some(after) = opts.stop_after {
        let stopper = session.clone();
        tokio::spawn(async move {
            tokio::time::sleep(after).await;
            if let Err(e) = stopper.stop_recording() {
                log::debug!("Timed stop ignored: {}", e);
            }
        });
    }

    if !opts.json {
        println!(
            "Recording (max {}s, max {} bytes) - press Ctrl-C to stop",
            limits.max_duration.as_secs(),
            limits.max_file_size_bytes
        );
    }
    let clip = session.start_recording(limits).await?;

    let asset = if opts.save {
        Some(session.save_clip().await?)
    } else {
        None
    };

    if opts.json {
        let out = serde_json::json!({
            "clip": clip,
            "asset_id": asset,
            "session": session.snapshot(),
        });
        println!("{}", serde_json::to_string(&out)?);
    } else {
        println!(
            "Recorded {} ({:.2}s, {} bytes)",
            clip.uri,
            clip.duration_secs.unwrap_or_default(),
            clip.size_bytes.unwrap_or_default()
        );
        match asset {
            Some(id) => println!("Saved to library as {}", id),
            None => println!("Not saved (pass --save to store it)"),
        }
    }

    Ok(())
}
