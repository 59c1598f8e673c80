use anyhow::Context;
use clap::{Parser, Subcommand};
use lee_common::db::core::Design;
use lee_common::db::parser::design::{self, DesignFile};
use lee_common::geom::coord::BinCoord;
use lee_common::util::config::Config;
use lee_common::util::{check, generator, logger, visualization};
use lee_router::{
    NetStatus, RoutingOptions, calculate_hpwl, calculate_net_hpwl, calculate_net_tree_wirelength,
    calculate_tree_wirelength, maze_routing,
};
use rand::SeedableRng;
use rand::rngs::StdRng;
use std::path::{Path, PathBuf};

#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Args {
    #[arg(short, long, value_name = "FILE", default_value = "config.toml")]
    config: PathBuf,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Random placement of the input design.
    Place,
    /// Route a placed design.
    Route,
    /// Optional placement followed by routing.
    Flow,
    /// Print the routing tree and bins of one net after routing.
    Net { name: String },
    Generate {
        #[arg(long, default_value_t = 200)]
        cells: usize,
        #[arg(long, default_value_t = 16)]
        ports: usize,
        #[arg(long, default_value_t = 150)]
        nets: usize,
        #[arg(long, default_value_t = 0.50)]
        utilization: f64,
        #[arg(long)]
        seed: Option<u64>,
        #[arg(long, default_value = "inputs/random.toml")]
        output: String,
    },
}

fn main() -> anyhow::Result<()> {
    logger::init();
    let args = Args::parse();

    let config = if args.config.exists() {
        log::info!("Loading configuration from {:?}", args.config);
        let config_str = std::fs::read_to_string(&args.config)
            .map_err(|e| anyhow::anyhow!("Failed to read config file: {}", e))?;
        toml::from_str(&config_str)
            .map_err(|e| anyhow::anyhow!("Failed to parse config TOML: {}", e))?
    } else {
        log::warn!(
            "Configuration file {:?} not found. Using internal defaults.",
            args.config
        );
        Config::default()
    };

    let command = args.command.unwrap_or(Commands::Flow);

    match command {
        Commands::Generate {
            cells,
            ports,
            nets,
            utilization,
            seed,
            output,
        } => {
            let safe_util = utilization.clamp(0.05, 0.95);
            if (safe_util - utilization).abs() > f64::EPSILON {
                log::warn!(
                    "Requested utilization {:.2} is unsafe. Clamped to {:.2}",
                    utilization,
                    safe_util
                );
            }
            prepare_output_dir(&output)?;
            let mut rng = make_rng(seed);
            generator::generate_random_design_file(
                &mut rng, &output, cells, ports, nets, safe_util,
            )?;
            log::info!("Generated: {}", output);
        }
        Commands::Place => {
            let mut design = load_design(&config.input.design_file)?;
            run_placement(&config, &mut design)?;
        }
        Commands::Route => {
            let input = &config.output.placed_design;
            if !Path::new(input).exists() {
                return Err(anyhow::anyhow!(
                    "Placed design missing: '{}'. Did you run 'place'?",
                    input
                ));
            }
            let mut design = load_design(input)?;
            if let Err(e) = run_routing(&config, &mut design) {
                log::error!("{:#}", e);
                std::process::exit(1);
            }
        }
        Commands::Flow => {
            let mut design = load_design(&config.input.design_file)?;
            if config.placement.enabled {
                run_placement(&config, &mut design)?;
            }
            if let Err(e) = run_routing(&config, &mut design) {
                log::error!("{:#}", e);
                std::process::exit(1);
            }
        }
        Commands::Net { name } => {
            let mut design = load_design(&config.input.design_file)?;
            route_design(&config, &mut design)?;
            print_net(&design, &name)?;
        }
    }

    Ok(())
}

fn make_rng(seed: Option<u64>) -> StdRng {
    match seed {
        Some(s) => StdRng::seed_from_u64(s),
        None => StdRng::from_entropy(),
    }
}

fn load_design(path: &str) -> anyhow::Result<Design> {
    log::info!("Parsing design: {}", path);
    design::parse(path).map_err(|e| anyhow::anyhow!("Invalid design file '{}': {:#}", path, e))
}

fn prepare_output_dir(path_str: &str) -> anyhow::Result<()> {
    if let Some(parent) = Path::new(path_str).parent() {
        if !parent.exists() && !parent.as_os_str().is_empty() {
            log::info!("Creating output directory: {:?}", parent);
            std::fs::create_dir_all(parent)?;
        }
    }
    Ok(())
}

fn run_placement(config: &Config, design: &mut Design) -> anyhow::Result<()> {
    let mut rng = make_rng(config.placement.seed);
    lee_placer::random_placer(design, config.placement.max_tries, &mut rng)?;

    let out = &config.output.placed_design;
    prepare_output_dir(out)?;
    log::info!("Writing placed design to {}", out);
    DesignFile::from_design(design).write(out)?;

    let (w, h) = design.core.layout_size();
    let (img_w, img_h) = image_size(w, h);
    let image = Path::new(out).with_extension("png");
    visualization::draw_placement(design, &image.to_string_lossy(), img_w, img_h);
    Ok(())
}

/// Creates the bins, applies the configured blockages and routes.
fn route_design(config: &Config, design: &mut Design) -> anyhow::Result<()> {
    design
        .create_bins(config.bins.width, config.bins.height)
        .context("Failed to create bins")?;
    for &[row, col] in &config.bins.blockages {
        let bin = BinCoord::new(row, col);
        let blocked = design
            .blockage(bin)
            .with_context(|| format!("Invalid blockage [{}, {}] in [bins]", row, col))?;
        if blocked {
            log::warn!("There is already a blockage in bin {}", bin);
            continue;
        }
        design
            .set_blockage(bin, true)
            .with_context(|| format!("Invalid blockage [{}, {}] in [bins]", row, col))?;
    }
    if !config.bins.blockages.is_empty() {
        log::info!("Applied {} blockages", config.bins.blockages.len());
    }

    let options = RoutingOptions::from(&config.routing);
    let report = maze_routing(design, &options)?;
    for net in report
        .nets
        .iter()
        .filter(|n| n.status != NetStatus::Routed)
    {
        log::warn!(
            "Net {}: {:?} ({} connected, {} skipped)",
            net.net,
            net.status,
            net.connected,
            net.skipped.len()
        );
    }
    Ok(())
}

fn run_routing(config: &Config, design: &mut Design) -> anyhow::Result<()> {
    route_design(config, design)?;

    let hpwl = calculate_hpwl(design);
    let tree_wl = calculate_tree_wirelength(design);
    log::info!("HPWL: {:.3}", hpwl);
    log::info!("Routed wirelength: {:.3}", tree_wl);
    if let Some(grids) = design.bins.as_ref() {
        log::info!(
            "Bin occupancy: max {}, {} bins used",
            grids.occupancy().max(),
            grids.occupancy().count_nonzero()
        );
    }

    let verified = check::run(design);

    let (w, h) = design.core.layout_size();
    let (img_w, img_h) = image_size(w, h);
    prepare_output_dir(&config.output.heatmap)?;
    log::info!("Generating routing heatmap...");
    visualization::draw_heatmap(design, &config.output.heatmap, img_w, img_h);

    prepare_output_dir(&config.output.snapshot)?;
    log::info!("Writing routed snapshot to {}", config.output.snapshot);
    let snapshot = toml::to_string_pretty(&design.snapshot())?;
    std::fs::write(&config.output.snapshot, snapshot)?;

    verified.map_err(|e| anyhow::anyhow!(e))
}

fn image_size(w: f64, h: f64) -> (u32, u32) {
    let longest = 1000.0;
    if w >= h {
        (longest as u32, ((h / w) * longest).max(1.0) as u32)
    } else {
        (((w / h) * longest).max(1.0) as u32, longest as u32)
    }
}

fn print_net(design: &Design, name: &str) -> anyhow::Result<()> {
    let id = design
        .net_by_name(name)
        .ok_or_else(|| anyhow::anyhow!("Unknown net '{}'", name))?;
    let net = &design.nets[id.index()];

    println!("Net {}", net.name);
    println!("  source: {}", design.pin_name(net.source));
    let drains: Vec<&str> = net.drains.iter().map(|&d| design.pin_name(d)).collect();
    println!("  drains: {}", drains.join(", "));
    println!("  HPWL: {:.3}", calculate_net_hpwl(design, id));
    println!(
        "  routed wirelength: {:.3}",
        calculate_net_tree_wirelength(net)
    );

    let Some(tree) = net.tree.as_ref() else {
        println!("  not routed");
        return Ok(());
    };
    println!("  bins: {}", net.claimed_bins.len());
    println!("  tree ({} points, depth {}):", tree.len(), tree.depth());
    let mut stack = vec![(tree.root(), 2usize)];
    while let Some((id, depth)) = stack.pop() {
        let node = tree.node(id);
        let p = node.point.effective_position();
        println!(
            "{}{} ({:.3}, {:.3}) bin {}",
            " ".repeat(depth * 2),
            node.name,
            p.x,
            p.y,
            node.point.bin
        );
        for &c in tree.children(id).iter().rev() {
            stack.push((c, depth + 1));
        }
    }
    Ok(())
}
