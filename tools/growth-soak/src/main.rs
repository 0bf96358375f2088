//! growth-soak: run growth instances headless against a synthetic target field.
//!
//! Usage:
//!   growth-soak --registry profiles.json --definition bloom --ticks 2000 --instances 16
//!   growth-soak --ticks 600 --targets 32 --seed 7

use std::collections::BTreeMap;
use std::fs;
use std::process;
use std::time::Instant;

use glam::DVec3;
use log::{info, warn};
use serde::Serialize;

use growth_core::events::EffectRequest;
use growth_core::types::Target;
use growth_sim::{
    GrowthEngine, InstanceKey, ProfileRegistry, RegionId, SimConfig, SimHost, StateBlob,
    TargetQuery,
};

/// Registry used when no `--registry` file is given.
const DEMO_REGISTRY: &str = r#"{
    "definitions": {
        "demo": {
            "min_scale": 0.5,
            "max_scale": 3.0,
            "growth_rate": 0.05,
            "growth_enabled": true,
            "pull_enabled": true,
            "wobble_enabled": true,
            "collision_enabled": true,
            "pull_profile": "vortex",
            "fuse_profile": "slow_burn",
            "explosion_profile": "triple",
            "particle_profile": "motes",
            "touch_damage": 1.0,
            "charges": 2
        }
    },
    "force": {
        "vortex": {
            "radius": 4.0,
            "strength": 0.3,
            "falloff": 1.5,
            "impact_damage": 0.5,
            "start_progress": 0.25,
            "ring": { "radii": [2.5], "width": 1.0, "behavior": { "type": "KeepOnRing", "min_correction": 0.25 } }
        }
    },
    "fuse": {
        "slow_burn": { "trigger": "Auto", "auto_progress": 0.9, "explosion_delay": 60, "pulse_interval": 10, "shell_collapse": 40 }
    },
    "explosion": {
        "triple": { "radius": 5.0, "max_damage": 12.0, "amount": 3, "amount_delay": 8 }
    },
    "particle": {
        "motes": { "effect": "mote", "count": 3, "interval_ticks": 15, "sound": "hum", "sound_interval_ticks": 80 }
    }
}"#;

const REGION: RegionId = RegionId(0);
const TARGET_HEALTH: f64 = 20.0;

fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let args: Vec<String> = std::env::args().skip(1).collect();
    if args.iter().any(|a| a == "help" || a == "--help" || a == "-h") {
        print_usage();
        return;
    }

    let options = match Options::parse(&args) {
        Ok(options) => options,
        Err(e) => {
            eprintln!("Error: {e}");
            print_usage();
            process::exit(1);
        }
    };

    match run(&options) {
        Ok(summary) => match serde_json::to_string_pretty(&summary) {
            Ok(json) => println!("{json}"),
            Err(e) => {
                eprintln!("Error: Failed to serialize summary: {e}");
                process::exit(1);
            }
        },
        Err(e) => {
            eprintln!("Error: {e}");
            process::exit(1);
        }
    }
}

fn print_usage() {
    eprintln!(
        "growth-soak: headless growth simulation soak test\n\
         \n\
         Options:\n\
         \n\
           --registry <path>   Profile registry JSON (default: built-in demo)\n\
           --definition <id>   Definition to spawn (default: demo)\n\
           --ticks <N>         Ticks to simulate (default: 1200)\n\
           --instances <N>     Instances to spawn (default: 8)\n\
           --targets <N>       Synthetic targets around each instance (default: 4)\n\
           --seed <N>          RNG seed (default: 42)\n\
         \n\
         Set RUST_LOG=debug to see profile fallbacks and fuse transitions.\n"
    );
}

struct Options {
    registry: Option<String>,
    definition: String,
    ticks: u64,
    instances: usize,
    targets: usize,
    seed: u64,
}

impl Options {
    fn parse(args: &[String]) -> Result<Self, String> {
        let mut options = Options {
            registry: None,
            definition: "demo".to_string(),
            ticks: 1200,
            instances: 8,
            targets: 4,
            seed: 42,
        };
        let mut i = 0;
        while i < args.len() {
            let flag = args[i].as_str();
            let value = args
                .get(i + 1)
                .ok_or_else(|| format!("Missing value for {flag}"))?;
            match flag {
                "--registry" => options.registry = Some(value.clone()),
                "--definition" => options.definition = value.clone(),
                "--ticks" => options.ticks = parse_number(flag, value)?,
                "--instances" => options.instances = parse_number(flag, value)?,
                "--targets" => options.targets = parse_number(flag, value)?,
                "--seed" => options.seed = parse_number(flag, value)?,
                other => return Err(format!("Unknown option: {other}")),
            }
            i += 2;
        }
        Ok(options)
    }
}

fn parse_number<T: std::str::FromStr>(flag: &str, value: &str) -> Result<T, String>
where
    T::Err: std::fmt::Display,
{
    value
        .parse()
        .map_err(|e| format!("Invalid value for {flag} '{value}': {e}"))
}

/// Synthetic world: targets that move when pushed and die when damaged enough.
#[derive(Default)]
struct SoakHost {
    targets: Vec<Target>,
    health: Vec<f64>,
    effects: BTreeMap<&'static str, usize>,
    saves: usize,
    saved_bytes: usize,
    syncs: usize,
}

impl SoakHost {
    fn new(centers: &[DVec3], per_center: usize) -> Self {
        let mut targets = Vec::new();
        for center in centers {
            for j in 0..per_center {
                let angle = j as f64 * 2.399_963;
                let distance = 1.0 + (j % 5) as f64;
                let offset = DVec3::new(angle.cos() * distance, 0.0, angle.sin() * distance);
                targets.push(Target::new(targets.len() as u64, *center + offset));
            }
        }
        Self {
            health: vec![TARGET_HEALTH; targets.len()],
            targets,
            ..Default::default()
        }
    }

    fn alive(&self) -> usize {
        self.targets.iter().filter(|t| t.alive).count()
    }
}

fn effect_kind(request: &EffectRequest) -> &'static str {
    match request {
        EffectRequest::SpawnParticles { .. } => "spawn_particles",
        EffectRequest::PlaySound { .. } => "play_sound",
        EffectRequest::ApplyDamage { .. } => "apply_damage",
        EffectRequest::ApplyVelocity { .. } => "apply_velocity",
        EffectRequest::CreateExplosion { .. } => "create_explosion",
        EffectRequest::UseItem { .. } => "use_item",
        EffectRequest::Broadcast(_) => "broadcast",
    }
}

impl SimHost for SoakHost {
    fn living_targets_in_box(&self, _region: RegionId, center: DVec3, radius: f64) -> Vec<Target> {
        self.targets.living_targets_in_box(center, radius)
    }

    fn submit(&mut self, _key: InstanceKey, request: EffectRequest) {
        *self.effects.entry(effect_kind(&request)).or_default() += 1;
        match request {
            EffectRequest::ApplyVelocity { target, delta } => {
                if let Some(t) = self.targets.get_mut(target.0 as usize) {
                    t.position += delta;
                }
            }
            EffectRequest::ApplyDamage { target, amount, .. } => {
                let index = target.0 as usize;
                if let (Some(t), Some(hp)) = (self.targets.get_mut(index), self.health.get_mut(index)) {
                    *hp -= amount;
                    if *hp <= 0.0 && t.alive {
                        t.alive = false;
                        info!("Target {} died", t.id);
                    }
                }
            }
            _ => {}
        }
    }

    fn persist(&mut self, _key: InstanceKey, blob: &StateBlob) {
        self.saves += 1;
        match blob.to_json() {
            Ok(json) => self.saved_bytes += json.len(),
            Err(e) => warn!("{e}"),
        }
    }

    fn request_sync(&mut self, _key: InstanceKey) {
        self.syncs += 1;
    }
}

#[derive(Serialize)]
struct Summary {
    definition: String,
    seed: u64,
    ticks: u64,
    instances_spawned: usize,
    instances_remaining: usize,
    instances_removed: usize,
    targets_total: usize,
    targets_alive: usize,
    saves: usize,
    saved_bytes: usize,
    syncs: usize,
    effects: BTreeMap<&'static str, usize>,
    elapsed_ms: u128,
}

fn run(options: &Options) -> Result<Summary, String> {
    let registry = match &options.registry {
        Some(path) => {
            let json = fs::read_to_string(path)
                .map_err(|e| format!("Failed to read registry '{path}': {e}"))?;
            ProfileRegistry::from_json(&json)?
        }
        None => ProfileRegistry::from_json(DEMO_REGISTRY)?,
    };
    if registry.definition_count() == 0 {
        warn!("Registry has no definitions; every instance will be inert");
    }

    let mut engine = GrowthEngine::new(
        SimConfig {
            seed: options.seed,
            ..Default::default()
        },
        registry,
    );
    let centers: Vec<DVec3> = (0..options.instances)
        .map(|i| DVec3::new(i as f64 * 16.0, 64.0, 0.0))
        .collect();
    for center in &centers {
        engine.spawn(REGION, &options.definition, *center);
    }
    let mut host = SoakHost::new(&centers, options.targets);

    info!(
        "Soaking {} instance(s) of '{}' for {} ticks",
        options.instances, options.definition, options.ticks
    );
    let started = Instant::now();
    let mut removed = 0;
    for _ in 0..options.ticks {
        let report = engine.tick(&mut host);
        removed += report.removed.len();
        if engine.instance_count() == 0 {
            info!("All instances spent at tick {}", report.tick);
            break;
        }
    }
    let elapsed_ms = started.elapsed().as_millis();

    Ok(Summary {
        definition: options.definition.clone(),
        seed: options.seed,
        ticks: engine.time().tick,
        instances_spawned: options.instances,
        instances_remaining: engine.instance_count(),
        instances_removed: removed,
        targets_total: host.targets.len(),
        targets_alive: host.alive(),
        saves: host.saves,
        saved_bytes: host.saved_bytes,
        syncs: host.syncs,
        effects: host.effects,
        elapsed_ms,
    })
}
