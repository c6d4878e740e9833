use std::{
    fs::File,
    io::{BufReader, BufWriter, Write as _},
    path::{Path, PathBuf},
    sync::Arc,
    time::{Duration, Instant},
};

use anyhow::Context as _;
use clap::Parser;
use evolvotron::{
    DisplayId, Farm, FarmOpts, GridOpts, Image, MutationConfig, MutationConfigOpts, NodeRegistry,
    Projection, RenderOpts, RenderTask, ZSweep, grid, progressive_tasks,
};
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(name = "evolvotron", version, about = "Evolve and render function-tree images")]
struct Cli {
    /// Render threads (default: available parallelism).
    #[arg(short = 't', long)]
    threads: Option<usize>,

    /// Grid columns.
    #[arg(short = 'c', long, default_value_t = 6)]
    cols: u32,

    /// Grid rows.
    #[arg(short = 'r', long, default_value_t = 5)]
    rows: u32,

    /// Cell side in pixels.
    #[arg(long, default_value_t = 128)]
    size: u32,

    /// Animation frames per image.
    #[arg(short = 'f', long, default_value_t = 1)]
    frames: u32,

    /// Animation playback rate, recorded in the output manifest.
    #[arg(short = 's', long, default_value_t = 8)]
    fps: u32,

    /// Put this function kind directly under every root (e.g. `Kaleidoscope`).
    #[arg(short = 'x', long, conflicts_with = "load")]
    favourite: Option<String>,

    /// With --favourite, keep the root's space transform to a plain scale.
    #[arg(short = 'X', long, requires = "favourite")]
    unwrapped: bool,

    /// Sample points on a sphere instead of a plane.
    #[arg(long)]
    spheremap: bool,

    /// Sweep z linearly across frames instead of sinusoidally.
    #[arg(long)]
    linear_z: bool,

    /// Sub-samples per pixel side.
    #[arg(short = 'm', long, default_value_t = 1)]
    multisample: u32,

    /// Jitter sub-samples within their cells.
    #[arg(short = 'j', long)]
    jitter: bool,

    /// Cool mutation strength as generations pass.
    #[arg(short = 'a', long)]
    autocool: bool,

    /// Start from this function document instead of random images; the other cells are its mutants.
    #[arg(long, value_name = "FILE")]
    load: Option<PathBuf>,

    /// Random seed (overrides the config file).
    #[arg(long)]
    seed: Option<u64>,

    /// Mutation settings as JSON.
    #[arg(long)]
    config: Option<PathBuf>,

    /// Generations to evolve, each spawning the grid from its first image.
    #[arg(long, default_value_t = 0)]
    generations: u32,

    /// Output directory.
    #[arg(long, default_value = "evolvotron-out")]
    out: PathBuf,
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_writer(std::io::stderr)
        .init();

    let grid = GridOpts {
        cols: cli.cols,
        rows: cli.rows,
        cell_size: cli.size,
        frames: cli.frames,
        fps: cli.fps,
    };
    grid.validate()?;
    let render_opts = RenderOpts {
        multisample: cli.multisample,
        jitter: cli.jitter,
    };
    render_opts.validate()?;

    let mut opts = match &cli.config {
        Some(path) => read_config(path)?,
        None => MutationConfigOpts::default(),
    };
    if cli.autocool {
        opts.autocool = true;
    }
    if let Some(seed) = cli.seed {
        opts.seed = seed;
    }

    let registry = NodeRegistry::new();
    let mut config = MutationConfig::new(opts, &registry);
    let z_sweep = if cli.linear_z {
        ZSweep::Linear
    } else {
        ZSweep::Sinusoidal
    };
    let projection = if cli.spheremap {
        Projection::Spheremap
    } else {
        Projection::Planar
    };

    let mut images = match &cli.load {
        Some(path) => {
            // Warnings were already logged while loading.
            let (loaded, _warnings) = Image::load_file(&registry, path)?;
            tracing::info!(file = %path.display(), nodes = loaded.stats().nodes, "loaded");
            spawn(&loaded, grid.cells(), &mut config)
        }
        None => (0..grid.cells())
            .map(|_| {
                Image::new_random(
                    &registry,
                    &mut config,
                    cli.favourite.as_deref(),
                    cli.unwrapped,
                    z_sweep,
                    projection,
                )
            })
            .collect::<Result<Vec<_>, _>>()?,
    };

    for generation in 1..=cli.generations {
        images = spawn(&images[0], grid.cells(), &mut config);
        if config.opts().autocool {
            config.autocool_step();
        }
        tracing::info!(
            generation,
            magnitude = config.magnitude(),
            nodes = images[0].stats().nodes,
            "evolved"
        );
    }

    let images: Vec<Arc<Image>> = images.into_iter().map(Arc::new).collect();
    let threads = cli.threads.unwrap_or_else(|| FarmOpts::default().threads);
    let mut farm = Farm::new(FarmOpts { threads })?;
    let rendered = render_all(&farm, &images, &grid, render_opts)?;
    farm.shutdown();

    write_outputs(&cli.out, &grid, &images, &rendered)?;
    eprintln!("wrote {} images to {}", images.len(), cli.out.display());
    Ok(())
}

fn read_config(path: &Path) -> anyhow::Result<MutationConfigOpts> {
    let f = File::open(path).with_context(|| format!("open config '{}'", path.display()))?;
    let opts = serde_json::from_reader(BufReader::new(f))
        .with_context(|| format!("parse config JSON '{}'", path.display()))?;
    Ok(opts)
}

/// The parent followed by `cells - 1` mutants of it. Constant mutants are retried a few times.
fn spawn(parent: &Image, cells: usize, config: &mut MutationConfig) -> Vec<Image> {
    const RETRIES: usize = 16;
    let mut next = Vec::with_capacity(cells);
    next.push(parent.deepclone());
    while next.len() < cells {
        let mut child = parent.mutated(config);
        for _ in 0..RETRIES {
            if !child.is_constant() {
                break;
            }
            child = parent.mutated(config);
        }
        next.push(child);
    }
    next
}

/// Render every image through the farm, keeping the finest level delivered per cell.
fn render_all(
    farm: &Farm,
    images: &[Arc<Image>],
    grid: &GridOpts,
    opts: RenderOpts,
) -> anyhow::Result<Vec<RenderTask>> {
    let started = Instant::now();
    for (i, image) in images.iter().enumerate() {
        farm.push_todo_all(progressive_tasks(
            image,
            DisplayId(i as u64),
            (grid.cell_size, grid.cell_size),
            grid.frames,
            image.serial(),
            opts,
        ));
    }

    let mut best: Vec<Option<RenderTask>> = images.iter().map(|_| None).collect();
    let mut last_report = Instant::now();
    loop {
        while let Some(task) = farm.pop_done() {
            let cell = task.display().0 as usize;
            let Some(slot) = best.get_mut(cell) else {
                continue;
            };
            if task.serial() != images[cell].serial() {
                continue;
            }
            if slot.as_ref().is_none_or(|b| task.level() < b.level()) {
                tracing::debug!(cell, level = task.level(), "delivered");
                *slot = Some(task);
            }
        }
        if farm.tasks_outstanding() == 0 {
            break;
        }
        if last_report.elapsed() >= Duration::from_secs(2) {
            tracing::info!(queues = %farm.write_info(), "rendering");
            last_report = Instant::now();
        }
        std::thread::sleep(Duration::from_millis(5));
    }
    tracing::info!(elapsed_ms = started.elapsed().as_millis() as u64, "render complete");

    best.into_iter()
        .enumerate()
        .map(|(cell, t)| {
            t.filter(|t| t.level() == 0)
                .with_context(|| format!("cell {cell} finished without a full-resolution render"))
        })
        .collect()
}

fn write_outputs(
    out: &Path,
    grid: &GridOpts,
    images: &[Arc<Image>],
    rendered: &[RenderTask],
) -> anyhow::Result<()> {
    std::fs::create_dir_all(out)
        .with_context(|| format!("create output dir '{}'", out.display()))?;

    let mut cells = Vec::with_capacity(images.len());
    for (i, (image, task)) in images.iter().zip(rendered).enumerate() {
        let (col, row) = grid.position(i);
        let stem = format!("cell-{row}-{col}");

        let mut frames = Vec::with_capacity(task.frames() as usize);
        for f in 0..task.frames() {
            let name = format!("{stem}-f{f:03}.png");
            let path = out.join(&name);
            let (w, h) = task.size();
            let pixels = task
                .frame(f)
                .with_context(|| format!("cell {i} has no frame {f}"))?;
            image::save_buffer_with_format(
                &path,
                &grid::rgb8(pixels),
                w,
                h,
                image::ColorType::Rgb8,
                image::ImageFormat::Png,
            )
            .with_context(|| format!("write png '{}'", path.display()))?;
            frames.push(name);
        }

        let xml_name = format!("{stem}.xml");
        let xml_path = out.join(&xml_name);
        let f = File::create(&xml_path)
            .with_context(|| format!("create '{}'", xml_path.display()))?;
        let mut w = BufWriter::new(f);
        image
            .save(&mut w)
            .and_then(|()| w.flush())
            .with_context(|| format!("write '{}'", xml_path.display()))?;

        cells.push(serde_json::json!({
            "col": col,
            "row": row,
            "function": xml_name,
            "frames": frames,
            "stats": image.stats(),
        }));
    }

    let manifest = serde_json::json!({
        "version": evolvotron::VERSION,
        "grid": grid,
        "cells": cells,
    });
    let path = out.join("manifest.json");
    let f = File::create(&path).with_context(|| format!("create '{}'", path.display()))?;
    let mut w = BufWriter::new(f);
    serde_json::to_writer_pretty(&mut w, &manifest)
        .with_context(|| format!("write '{}'", path.display()))?;
    w.flush()
        .with_context(|| format!("write '{}'", path.display()))?;
    Ok(())
}
