//! Tiled Image - command line access to large images through a tile cache.
//!
//! Builds a tiled image over a raw file or a synthetic in-memory image and
//! runs one of the `scan`, `probe` or `fill` commands against it.

use clap::Parser;
use std::process::ExitCode;
use tracing::{debug, error, info};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use tiled_image::{
    config::{
        Cli, Command, FillConfig, ImageArgs, ProbeConfig, ReadPolicyChoice, SampleType,
        WritePolicyChoice,
    },
    report::{FillReport, ProbeReport, Report, ScanReport},
    shared, AnyReadPolicy, AnyWritePolicy, DenseImage, FifoPolicy, ImageFactory,
    ImageFactoryFromImage, LastTilePolicy, LruPolicy, Point, RawFileImageFactory, Sample,
    TiledImage, WriteBack, WriteThrough,
};

fn main() -> ExitCode {
    let cli = Cli::parse();
    let command = cli.into_command();

    let args = command.image();
    init_logging(args.verbose);

    // Validate configuration
    if let Err(e) = command.validate() {
        error!("Configuration error: {}", e);
        return ExitCode::FAILURE;
    }

    let result = match args.dimension() {
        2 => run_dimension::<2>(&command),
        3 => run_dimension::<3>(&command),
        d => Err(format!("unsupported dimension {}", d)),
    };

    let report = match result {
        Ok(report) => report,
        Err(e) => {
            error!("{}", e);
            return ExitCode::FAILURE;
        }
    };

    if args.json {
        match report.to_json() {
            Ok(json) => println!("{}", json),
            Err(e) => {
                error!("Failed to serialize report: {}", e);
                return ExitCode::FAILURE;
            }
        }
    } else {
        print!("{}", report);
    }

    ExitCode::SUCCESS
}

/// Initialize the tracing/logging subsystem.
fn init_logging(verbose: bool) {
    let env_filter = if verbose {
        "tiled_image=debug"
    } else {
        "tiled_image=warn"
    };

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| env_filter.into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();
}

// =============================================================================
// Image Construction
// =============================================================================

fn run_dimension<const D: usize>(command: &Command) -> Result<Report, String> {
    match command.image().sample {
        SampleType::U8 => run_sample::<u8, D>(command),
        SampleType::U16 => run_sample::<u16, D>(command),
        SampleType::F32 => run_sample::<f32, D>(command),
    }
}

fn run_sample<V: Sample, const D: usize>(command: &Command) -> Result<Report, String> {
    let args = command.image();
    let domain = args.domain::<D>().map_err(|e| e.to_string())?;

    info!(%domain, tiles = args.tiles, "building tiled image");
    match args.raw {
        Some(ref path) => {
            let factory = match command {
                // Filling a missing file creates it.
                Command::Fill(_) if !path.exists() => {
                    RawFileImageFactory::<V, D>::create(path, domain, V::default())
                }
                _ => RawFileImageFactory::<V, D>::open(path, domain),
            }
            .map_err(|e| format!("{}: {}", path.display(), e))?;
            run_command(factory, command)
        }
        None => {
            let image = DenseImage::from_fn(domain, |p| V::from_f64(synthetic_value(p)));
            run_command(ImageFactoryFromImage::new(image), command)
        }
    }
}

/// Deterministic content for the in-memory image: a diagonal ramp.
fn synthetic_value<const D: usize>(point: &Point<D>) -> f64 {
    point.iter().map(|c| c.rem_euclid(256)).sum::<i64>().rem_euclid(256) as f64
}

type Tiled<F, V, const D: usize> =
    TiledImage<F, AnyReadPolicy<DenseImage<V, D>, D>, AnyWritePolicy, D>;

fn build_tiled<F, V, const D: usize>(factory: F, args: &ImageArgs) -> Result<Tiled<F, V, D>, String>
where
    F: ImageFactory<D, Output = DenseImage<V, D>>,
    V: Sample,
{
    let read_policy = match args.read_policy {
        ReadPolicyChoice::Lru => AnyReadPolicy::Lru(LruPolicy::new(args.cache_tiles)),
        ReadPolicyChoice::Fifo => AnyReadPolicy::Fifo(FifoPolicy::new(args.cache_tiles)),
        ReadPolicyChoice::Last => AnyReadPolicy::Last(LastTilePolicy::new()),
    };
    let write_policy = match args.write_policy {
        WritePolicyChoice::Through => AnyWritePolicy::Through(WriteThrough::new()),
        WritePolicyChoice::Back => AnyWritePolicy::Back(WriteBack::new()),
    };

    let tiled = TiledImage::new(
        shared(factory),
        shared(read_policy),
        shared(write_policy),
        args.tiles,
    )
    .map_err(|e| e.to_string())?
    .with_timings(args.timings);

    debug!(%tiled, read_policy = ?args.read_policy, write_policy = ?args.write_policy, "ready");
    Ok(tiled)
}

fn run_command<F, V, const D: usize>(factory: F, command: &Command) -> Result<Report, String>
where
    F: ImageFactory<D, Output = DenseImage<V, D>>,
    V: Sample,
{
    let args = command.image();
    let tiled = build_tiled(factory, args)?;
    match command {
        Command::Scan(_) => run_scan(&tiled, args.timings),
        Command::Probe(config) => run_probe(&tiled, config, args.timings),
        Command::Fill(config) => run_fill(&tiled, config, args.timings),
    }
}

// =============================================================================
// Scan Command
// =============================================================================

fn run_scan<F, V, const D: usize>(tiled: &Tiled<F, V, D>, timings: bool) -> Result<Report, String>
where
    F: ImageFactory<D, Output = DenseImage<V, D>>,
    V: Sample,
{
    let mut visited = 0u64;
    let mut checksum = 0.0;
    for item in tiled.values() {
        let (_, value) = item.map_err(|e| e.to_string())?;
        visited += 1;
        checksum += value.to_f64();
    }

    info!(visited, misses = tiled.cache_miss_read(), "scan complete");
    Ok(Report::Scan(ScanReport {
        domain: tiled.domain().to_string(),
        tiles_per_axis: tiled.tiles_per_axis(),
        tile_count: tiled.tile_count(),
        visited,
        checksum,
        cache: tiled.cache_stats(),
        timings: timings.then(|| tiled.timings()),
    }))
}

// =============================================================================
// Probe Command
// =============================================================================

fn run_probe<F, V, const D: usize>(
    tiled: &Tiled<F, V, D>,
    config: &ProbeConfig,
    timings: bool,
) -> Result<Report, String>
where
    F: ImageFactory<D, Output = DenseImage<V, D>>,
    V: Sample,
{
    let point = config.point::<D>().map_err(|e| e.to_string())?;
    let value = tiled.get(&point).map_err(|e| e.to_string())?;
    let tile = tiled.find_sub_domain(&point);

    Ok(Report::Probe(ProbeReport {
        point: point.iter().collect(),
        value: value.to_f64(),
        tile: tile.to_string(),
        cache: tiled.cache_stats(),
        timings: timings.then(|| tiled.timings()),
    }))
}

// =============================================================================
// Fill Command
// =============================================================================

fn run_fill<F, V, const D: usize>(
    tiled: &Tiled<F, V, D>,
    config: &FillConfig,
    timings: bool,
) -> Result<Report, String>
where
    F: ImageFactory<D, Output = DenseImage<V, D>>,
    V: Sample,
{
    let value = V::from_f64(config.value);
    let mut written = 0u64;
    for point in tiled.points() {
        tiled.set_value(&point, value).map_err(|e| e.to_string())?;
        written += 1;
    }

    tiled.flush().map_err(|e| e.to_string())?;
    if config.clear {
        tiled.clear_cache().map_err(|e| e.to_string())?;
    }

    info!(written, "fill complete");
    Ok(Report::Fill(FillReport {
        domain: tiled.domain().to_string(),
        value: config.value,
        written,
        cleared: config.clear,
        cache: tiled.cache_stats(),
        timings: timings.then(|| tiled.timings()),
    }))
}
