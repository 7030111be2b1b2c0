//! Clipforge CLI: scene segmentation and overlay composition.
//!
//! Usage:
//!   clipforge segment <SAMPLES>      Segment a change-metric stream into scenes
//!   clipforge detect <SAMPLES>       Full scene detection run (segment + thumbnails)
//!   clipforge compile <OVERLAYS>     Compile overlays into transform operations
//!   clipforge render <OVERLAYS>      Compile and apply overlays to a media item
//!   clipforge thumbnails             Plan and grab thumbnails
//!   clipforge crop                   Content-aware crop
//!   clipforge config                 Show or initialize the configuration

use std::path::PathBuf;

use clap::{Parser, Subcommand};

use clipforge_common::config::AppConfig;

mod commands;

#[derive(Parser)]
#[command(
    name = "clipforge",
    about = "Scene segmentation and overlay composition for media pipelines",
    version,
    author
)]
struct Cli {
    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Segment change-metric samples into scenes
    Segment {
        /// Samples file (JSONL, or a scene-metadata dump with --metadata-dump)
        samples: PathBuf,

        /// Media duration in seconds (defaults to the last sample)
        #[arg(long)]
        duration: Option<f64>,

        /// Minimum scene duration in seconds
        #[arg(long)]
        min_scene: Option<f64>,

        /// Change score a sample must exceed to cut
        #[arg(long)]
        threshold: Option<f64>,

        /// Parse the input as `pts_time` / `lavfi.scene_score` lines.
        /// Every dumped frame is a cut, so the stream end must come from --duration.
        #[arg(long, requires = "duration")]
        metadata_dump: bool,

        /// Write JSON here instead of stdout
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Run scene detection through the pipeline
    Detect {
        /// Samples file (JSONL)
        samples: PathBuf,

        /// Media reference (URL or provider content id)
        #[arg(long)]
        media: String,

        /// Media duration in seconds
        #[arg(long)]
        duration: Option<f64>,

        /// Media width
        #[arg(long, default_value = "1920")]
        width: u32,

        /// Media height
        #[arg(long, default_value = "1080")]
        height: u32,

        /// Media frame rate
        #[arg(long, default_value = "30")]
        fps: f64,

        /// Skip per-scene thumbnails
        #[arg(long)]
        no_thumbnails: bool,

        /// Directory for job manifests
        #[arg(long)]
        manifest_dir: Option<PathBuf>,

        /// Write JSON here instead of stdout
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Compile overlays into ordered transform operations
    Compile {
        /// Overlay list (JSON array)
        overlays: PathBuf,

        /// Media width
        #[arg(long, default_value = "1920")]
        width: u32,

        /// Media height
        #[arg(long, default_value = "1080")]
        height: u32,

        /// Only overlays active at this time (seconds)
        #[arg(long)]
        at: Option<f64>,

        /// JSON map of transient references to uploaded durable ids
        #[arg(long)]
        uploads: Option<PathBuf>,

        /// Write JSON here instead of stdout
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Compile overlays and apply them to a media item
    Render {
        /// Overlay list (JSON array)
        overlays: PathBuf,

        /// Media reference (URL or provider content id)
        #[arg(long)]
        media: String,

        /// Media width
        #[arg(long, default_value = "1920")]
        width: u32,

        /// Media height
        #[arg(long, default_value = "1080")]
        height: u32,

        /// JSON map of transient references to uploaded durable ids
        #[arg(long)]
        uploads: Option<PathBuf>,

        /// Directory for job manifests
        #[arg(long)]
        manifest_dir: Option<PathBuf>,

        /// Write JSON here instead of stdout
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Plan and grab thumbnails
    Thumbnails {
        /// Media reference (URL or provider content id)
        #[arg(long)]
        media: String,

        /// Media duration in seconds
        #[arg(long)]
        duration: f64,

        /// Number of thumbnails
        #[arg(long, default_value = "6")]
        count: u32,

        /// Pick the start of the longest scenes
        #[arg(long)]
        smart: bool,

        /// Scenes JSON (output of `segment`) for --smart
        #[arg(long)]
        scenes: Option<PathBuf>,

        /// Output format: jpg|png|webp
        #[arg(long, default_value = "jpg")]
        format: String,

        /// Directory for job manifests
        #[arg(long)]
        manifest_dir: Option<PathBuf>,

        /// Write JSON here instead of stdout
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Content-aware fill crop
    Crop {
        /// Media reference (URL or provider content id)
        #[arg(long)]
        media: String,

        /// Focus mode: auto|face|object
        #[arg(long, default_value = "auto")]
        mode: String,

        /// Output width
        #[arg(long, default_value = "1080")]
        width: u32,

        /// Output height
        #[arg(long, default_value = "1920")]
        height: u32,

        /// Custom focus point as normalized `x,y`
        #[arg(long)]
        focus: Option<String>,

        /// Directory for job manifests
        #[arg(long)]
        manifest_dir: Option<PathBuf>,

        /// Write JSON here instead of stdout
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Show the effective configuration
    Config {
        /// Write the current configuration to the config file
        #[arg(long)]
        init: bool,

        /// Print the config file path only
        #[arg(long)]
        path: bool,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Logging is configured by the file, so a rejected file is reported
    // once the subscriber is up.
    let (mut config, rejected) = match AppConfig::load_checked() {
        Ok(config) => (config, None),
        Err(e) => (AppConfig::default(), Some(e)),
    };
    if cli.verbose {
        config.logging.level = "debug".to_string();
    }
    clipforge_common::logging::init_logging(&config.logging);
    if let Some(e) = rejected {
        tracing::warn!(error = %e, "Using default configuration");
    }

    match cli.command {
        Commands::Segment {
            samples,
            duration,
            min_scene,
            threshold,
            metadata_dump,
            output,
        } => commands::segment::run(
            &config,
            samples,
            duration,
            min_scene,
            threshold,
            metadata_dump,
            output,
        ),
        Commands::Detect {
            samples,
            media,
            duration,
            width,
            height,
            fps,
            no_thumbnails,
            manifest_dir,
            output,
        } => {
            commands::detect::run(
                &config,
                samples,
                media,
                duration,
                (width, height, fps),
                no_thumbnails,
                manifest_dir,
                output,
            )
            .await
        }
        Commands::Compile {
            overlays,
            width,
            height,
            at,
            uploads,
            output,
        } => commands::compile::run(overlays, width, height, at, uploads, output),
        Commands::Render {
            overlays,
            media,
            width,
            height,
            uploads,
            manifest_dir,
            output,
        } => {
            commands::render::run(
                &config,
                overlays,
                media,
                width,
                height,
                uploads,
                manifest_dir,
                output,
            )
            .await
        }
        Commands::Thumbnails {
            media,
            duration,
            count,
            smart,
            scenes,
            format,
            manifest_dir,
            output,
        } => {
            commands::thumbnails::run(
                &config,
                media,
                duration,
                count,
                smart,
                scenes,
                format,
                manifest_dir,
                output,
            )
            .await
        }
        Commands::Crop {
            media,
            mode,
            width,
            height,
            focus,
            manifest_dir,
            output,
        } => {
            commands::crop::run(&config, media, mode, width, height, focus, manifest_dir, output)
                .await
        }
        Commands::Config { init, path } => commands::config::run(&config, init, path),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_metadata_dump_requires_duration() {
        let missing = Cli::try_parse_from(["clipforge", "segment", "dump.txt", "--metadata-dump"]);
        assert!(missing.is_err());

        let given = Cli::try_parse_from([
            "clipforge",
            "segment",
            "dump.txt",
            "--metadata-dump",
            "--duration",
            "20",
        ]);
        assert!(given.is_ok());
    }

    #[test]
    fn test_jsonl_samples_default_duration() {
        assert!(Cli::try_parse_from(["clipforge", "segment", "samples.jsonl"]).is_ok());
    }
}
