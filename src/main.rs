use sphere_drift::{SimConfig, Simulation};

fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    if let Err(e) = Simulation::new(SimConfig::default()).run() {
        log::error!("{}", e);
        std::process::exit(1);
    }
}
