//! LED status signals.
//!
//! Exactly one pattern is shown per tick. The robot registers one source per
//! condition it wants to report and the [`SignalArbiter`] commits the
//! highest-precedence match; the driving meteor is the fallback.

use crate::messages::{Color, LedPattern};
use crate::subsystems::{FlywheelSetpoint, RetractorSetpoint, Subsystems};
use parking_lot::RwLock;
use std::fmt;
use std::sync::Arc;
use strider_core::{condition, ModeController, SignalArbiter, StriderResult, TickContext};

pub const DEFAULT_LED_COUNT: usize = 40;
const METEOR_DECAY: f64 = 0.25;
/// Retractor counts as "down" within this many degrees of the intake angle
const INTAKE_DOWN_TOLERANCE_DEG: f64 = 30.0;

pub mod priority {
    pub const DRIVING: u32 = 0;
    pub const CLIMBING: u32 = 1;
    pub const AMP: u32 = 2;
    pub const REVVED: u32 = 3;
    pub const REVVING: u32 = 4;
    pub const NOTE_IN_SUCKER: u32 = 5;
    pub const INTAKE_DOWN: u32 = 6;
}

#[derive(Debug)]
struct StripState {
    pattern: LedPattern,
    buffer: Vec<Color>,
}

/// LED strip frame buffer
#[derive(Clone)]
pub struct LedStrip {
    state: Arc<RwLock<StripState>>,
}

impl LedStrip {
    pub fn new(len: usize) -> Self {
        Self {
            state: Arc::new(RwLock::new(StripState {
                pattern: LedPattern::default(),
                buffer: vec![Color::OFF; len],
            })),
        }
    }

    pub fn len(&self) -> usize {
        self.state.read().buffer.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn pattern(&self) -> LedPattern {
        self.state.read().pattern
    }

    pub fn buffer(&self) -> Vec<Color> {
        self.state.read().buffer.clone()
    }

    /// Render `pattern` for the frame at `ctx`
    pub fn show(&self, pattern: LedPattern, ctx: &TickContext) {
        let mut state = self.state.write();
        state.pattern = pattern;
        let len = state.buffer.len();
        match pattern {
            LedPattern::Solid(color) => state.buffer.fill(color),
            LedPattern::MeteorRain { color, decay } => {
                if len == 0 {
                    return;
                }
                let head = (ctx.tick() % len as u64) as usize;
                let keep = 1.0 - decay.clamp(0.0, 1.0);
                for (i, led) in state.buffer.iter_mut().enumerate() {
                    let behind = (head + len - i) % len;
                    *led = color.dimmed(keep.powi(behind as i32));
                }
            }
        }
    }
}

impl fmt::Debug for LedStrip {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let state = self.state.read();
        f.debug_struct("LedStrip")
            .field("len", &state.buffer.len())
            .field("pattern", &state.pattern)
            .finish()
    }
}

fn solid(strip: &LedStrip, color: Color) -> impl FnMut(&TickContext) + Send + 'static {
    let strip = strip.clone();
    move |ctx| strip.show(LedPattern::Solid(color), ctx)
}

fn meteor(strip: &LedStrip, color: Color) -> impl FnMut(&TickContext) + Send + 'static {
    let strip = strip.clone();
    move |ctx| {
        strip.show(
            LedPattern::MeteorRain {
                color,
                decay: METEOR_DECAY,
            },
            ctx,
        )
    }
}

/// Register the robot's status signals on `arbiter`
pub fn register_robot_signals(
    arbiter: &mut SignalArbiter,
    strip: &LedStrip,
    subsystems: &Subsystems,
    mode: &Arc<ModeController>,
) -> StriderResult<()> {
    arbiter.register_fallback(
        priority::DRIVING,
        "driving",
        meteor(strip, Color::DRIVING_METEOR),
    )?;

    arbiter.register(
        priority::CLIMBING,
        "climbing",
        mode.condition(),
        meteor(strip, Color::CLIMBING_METEOR),
    )?;

    let retractor = subsystems.retractor.clone();
    arbiter.register(
        priority::AMP,
        "amp",
        condition(move || retractor.goal_deg() == RetractorSetpoint::Amp.angle()),
        solid(strip, Color::PURPLE),
    )?;

    let flywheel = subsystems.flywheel.clone();
    arbiter.register(
        priority::REVVED,
        "revved",
        condition(move || {
            flywheel.is_revved() && flywheel.goal_rpm() >= FlywheelSetpoint::AcceptHandoff.rpm()
        }),
        solid(strip, Color::GREEN),
    )?;

    let flywheel = subsystems.flywheel.clone();
    arbiter.register(
        priority::REVVING,
        "revving",
        condition(move || {
            !flywheel.is_revved() && flywheel.goal_rpm() > FlywheelSetpoint::AcceptHandoff.rpm()
        }),
        solid(strip, Color::YELLOW),
    )?;

    let sucker = subsystems.sucker.clone();
    arbiter.register(
        priority::NOTE_IN_SUCKER,
        "note_in_sucker",
        condition(move || sucker.note_detected()),
        solid(strip, Color::WHITE),
    )?;

    let retractor = subsystems.retractor.clone();
    arbiter.register(
        priority::INTAKE_DOWN,
        "intake_down",
        condition(move || {
            retractor.is_near(RetractorSetpoint::Intake, INTAKE_DOWN_TOLERANCE_DEG)
        }),
        solid(strip, Color::ORANGE),
    )?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    fn ctx(tick: u64) -> TickContext {
        TickContext::new(tick, Duration::from_millis(20))
    }

    #[test]
    fn test_solid_fills_strip() {
        let strip = LedStrip::new(5);
        strip.show(LedPattern::Solid(Color::GREEN), &ctx(0));
        assert!(strip.buffer().iter().all(|c| *c == Color::GREEN));
    }

    #[test]
    fn test_meteor_head_moves() {
        let strip = LedStrip::new(4);
        let pattern = LedPattern::MeteorRain {
            color: Color::WHITE,
            decay: 0.5,
        };
        strip.show(pattern, &ctx(1));
        let frame = strip.buffer();
        assert_eq!(frame[1], Color::WHITE);
        assert_eq!(frame[0], Color::WHITE.dimmed(0.5));
        // Trail wraps around the end of the strip
        assert_eq!(frame[2], Color::WHITE.dimmed(0.125));

        strip.show(pattern, &ctx(2));
        assert_eq!(strip.buffer()[2], Color::WHITE);
    }

    #[test]
    fn test_empty_strip() {
        let strip = LedStrip::new(0);
        strip.show(
            LedPattern::MeteorRain {
                color: Color::WHITE,
                decay: 0.5,
            },
            &ctx(3),
        );
        assert!(strip.is_empty());
    }
}
