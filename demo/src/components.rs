use flowrt::prelude::{Component, Node, NodeBuilder, NodeIo};
use std::f64::consts::PI;
use std::thread;
use std::time::Duration;

/// Emits one sine sample every 10 ms. Amplitude and period arrive as
/// initial configuration messages.
pub struct SineWave {
    period: u32,
    amplitude: u32,
    tick: u32,
}

impl SineWave {
    pub const AMPLITUDE: u32 = 0;
    pub const PERIOD: u32 = 1;
    pub const PHASE: u32 = 2;
    pub const OUT: u32 = 0;

    pub fn node() -> Node {
        NodeBuilder::new()
            .input::<u32>(Self::AMPLITUDE, 1)
            .input::<u32>(Self::PERIOD, 1)
            .input::<u32>(Self::PHASE, 1)
            .output::<f64>(Self::OUT)
            .build(Self {
                period: 0,
                amplitude: 1,
                tick: 0,
            })
    }
}

impl Component for SineWave {
    fn initialize(&mut self, io: &mut NodeIo) {
        if let Ok(period) = io.recv::<u32>(Self::PERIOD) {
            self.period = period.max(1);
        }
        if let Ok(amplitude) = io.recv::<u32>(Self::AMPLITUDE) {
            self.amplitude = amplitude;
        }
    }

    fn process(&mut self, io: &mut NodeIo) {
        let sample =
            f64::from(self.amplitude) * (2.0 * PI * f64::from(self.tick) / f64::from(self.period)).sin();
        self.tick = self.tick.wrapping_add(1);

        if io.send::<f64>(Self::OUT, sample).is_err() {
            return;
        }

        thread::sleep(Duration::from_millis(10));
    }
}

/// Rectangular wave generator. Duty cycle is given in percent and may be
/// retuned at runtime through the duty port.
pub struct RectifiedWave {
    counter: u32,
    period: u32,
    duty: u32,
}

impl RectifiedWave {
    pub const PERIOD: u32 = 0;
    pub const DUTY: u32 = 1;
    pub const CLK: u32 = 2;
    pub const OUT: u32 = 0;

    pub fn node() -> Node {
        NodeBuilder::new()
            .input::<u32>(Self::PERIOD, 1)
            .input::<u32>(Self::DUTY, 1)
            .input::<bool>(Self::CLK, 1)
            .output::<f64>(Self::OUT)
            .build(Self {
                counter: 0,
                period: 1,
                duty: 100,
            })
    }
}

impl Component for RectifiedWave {
    fn initialize(&mut self, io: &mut NodeIo) {
        if let Ok(period) = io.recv::<u32>(Self::PERIOD) {
            self.period = period.max(1);
        }
        if let Ok(duty) = io.recv::<u32>(Self::DUTY) {
            self.duty = duty;
        }
    }

    fn process(&mut self, io: &mut NodeIo) {
        if io.has_message(Self::DUTY) {
            if let Ok(duty) = io.recv::<u32>(Self::DUTY) {
                self.duty = duty;
            }
        }

        let threshold = (f64::from(self.duty) / 100.0) * f64::from(self.period);
        let level = if f64::from(self.counter) < threshold {
            50.0
        } else {
            0.0
        };
        if io.send::<f64>(Self::OUT, level).is_err() {
            return;
        }

        self.counter = (self.counter + 1) % self.period;
    }
}

/// Windowed mean over the incoming sample stream. The window width is
/// configurable and may be changed while running.
pub struct MovingAverage {
    window: Vec<f64>,
}

impl MovingAverage {
    pub const IN: u32 = 0;
    pub const WIDTH: u32 = 1;
    pub const OUT: u32 = 0;

    pub fn node() -> Node {
        NodeBuilder::new()
            .input::<f64>(Self::IN, 1)
            .input::<u32>(Self::WIDTH, 1)
            .output::<f64>(Self::OUT)
            .build(Self { window: Vec::new() })
    }

    fn resize(&mut self, width: u32) {
        self.window = vec![0.0; width.max(1) as usize];
    }
}

impl Component for MovingAverage {
    fn initialize(&mut self, io: &mut NodeIo) {
        if let Ok(width) = io.recv::<u32>(Self::WIDTH) {
            self.resize(width);
        }
    }

    fn process(&mut self, io: &mut NodeIo) {
        if io.has_message(Self::WIDTH) {
            if let Ok(width) = io.recv::<u32>(Self::WIDTH) {
                self.resize(width);
            }
        }

        let Ok(sample) = io.recv::<f64>(Self::IN) else {
            return;
        };

        self.window.rotate_left(1);
        if let Some(last) = self.window.last_mut() {
            *last = sample;
        }

        let mean = self.window.iter().sum::<f64>() / self.window.len() as f64;
        let _ = io.send::<f64>(Self::OUT, mean);
    }
}

/// Sums its two inputs pairwise.
pub struct Adder;

impl Adder {
    pub const LHS: u32 = 0;
    pub const RHS: u32 = 1;
    pub const OUT: u32 = 0;

    pub fn node() -> Node {
        NodeBuilder::new()
            .input::<f64>(Self::LHS, 10)
            .input::<f64>(Self::RHS, 10)
            .output::<f64>(Self::OUT)
            .build(Self)
    }
}

impl Component for Adder {
    fn initialize(&mut self, _io: &mut NodeIo) {}

    fn process(&mut self, io: &mut NodeIo) {
        let Ok(lhs) = io.recv::<f64>(Self::LHS) else {
            return;
        };
        let Ok(rhs) = io.recv::<f64>(Self::RHS) else {
            return;
        };
        let _ = io.send::<f64>(Self::OUT, lhs + rhs);
    }
}

/// Writes every incoming sample to stdout, one value per line.
pub struct Plotter;

impl Plotter {
    pub const IN: u32 = 1;

    pub fn node() -> Node {
        NodeBuilder::new().input::<f64>(Self::IN, 1).build(Self)
    }
}

impl Component for Plotter {
    fn initialize(&mut self, _io: &mut NodeIo) {}

    fn process(&mut self, io: &mut NodeIo) {
        if let Ok(value) = io.recv::<f64>(Self::IN) {
            println!("{value}");
        }
    }
}
