mod components;

use crate::components::{Adder, MovingAverage, Plotter, RectifiedWave, SineWave};
use flowrt::prelude::Runtime;
use flowrt::utils::logger::{self, LogConfig};
use signal_hook::consts::TERM_SIGNALS;
use signal_hook::flag;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::Duration;

fn main() -> anyhow::Result<()> {
    let _log_guard = logger::init(&LogConfig::from_env())?;

    let mut rt = Runtime::new();

    rt.register_component("SineWave", SineWave::node);
    rt.register_component("RectifiedWave", RectifiedWave::node);
    rt.register_component("MovingAverage", MovingAverage::node);
    rt.register_component("Adder", Adder::node);
    rt.register_component("Plotter", Plotter::node);

    rt.add_node("RectifiedWave", "PWM")?;
    rt.add_node("SineWave", "SIN1")?;
    rt.add_node("SineWave", "SIN2")?;
    rt.add_node("Adder", "ADD")?;
    rt.add_node("Adder", "ADD2")?;
    rt.add_node("MovingAverage", "MA")?;
    rt.add_node("Plotter", "PLOT")?;

    rt.add_initial("PWM", RectifiedWave::PERIOD, 600u32);
    rt.add_initial("PWM", RectifiedWave::DUTY, 40u32);
    rt.add_initial("SIN1", SineWave::PERIOD, 200u32);
    rt.add_initial("SIN1", SineWave::AMPLITUDE, 3u32);
    rt.add_initial("SIN2", SineWave::PERIOD, 5u32);
    rt.add_initial("SIN2", SineWave::AMPLITUDE, 1u32);
    rt.add_initial("MA", MovingAverage::WIDTH, 4u32);

    rt.add_edge("SIN1", SineWave::OUT, "ADD", Adder::LHS);
    rt.add_edge("SIN2", SineWave::OUT, "ADD", Adder::RHS);
    rt.add_edge("ADD", Adder::OUT, "ADD2", Adder::RHS);
    rt.add_edge("PWM", RectifiedWave::OUT, "ADD2", Adder::LHS);
    rt.add_edge("ADD2", Adder::OUT, "MA", MovingAverage::IN);
    rt.add_edge("MA", MovingAverage::OUT, "PLOT", Plotter::IN);

    rt.start_network();

    let term = Arc::new(AtomicBool::new(false));
    for sig in TERM_SIGNALS {
        flag::register(*sig, term.clone())?;
    }

    while !term.load(Ordering::Relaxed) {
        thread::sleep(Duration::from_millis(100));
    }

    tracing::info!("termination signal received");
    rt.stop_network();

    Ok(())
}
