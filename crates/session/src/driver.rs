use std::time::Duration;
use tileworld_kernel::WorldEvent;
use tileworld_render::Renderer;

use crate::frame_stats::{FrameTimer, SessionStats};
use crate::session::Session;
use crate::ticker::Ticker;
use crate::transport::Transport;

/// The per-frame loop: pump inbound, render, update, fire tickers.
///
/// Time is passed in rather than read, so a run is deterministic for a given
/// sequence of frame durations.
pub struct FrameDriver<T, R> {
    session: Session<T>,
    renderer: R,
    clock: Duration,
    max_dt: Duration,
    animation: Ticker,
    heartbeat: Ticker,
    timer: FrameTimer,
    stats: SessionStats,
}

impl<T: Transport, R: Renderer> FrameDriver<T, R> {
    pub fn new(session: Session<T>, renderer: R) -> Self {
        let config = session.config();
        let animation = Ticker::new(config.animation_period(), Duration::ZERO);
        let heartbeat = Ticker::new(config.heartbeat_period(), Duration::ZERO);
        let max_dt = config.max_frame_dt();
        Self {
            session,
            renderer,
            clock: Duration::ZERO,
            max_dt,
            animation,
            heartbeat,
            timer: FrameTimer::default(),
            stats: SessionStats::default(),
        }
    }

    /// Run one frame that took `elapsed` since the previous one.
    pub fn frame(&mut self, elapsed: Duration) -> R::Output {
        let _span = tracing::info_span!("frame", n = self.stats.frames).entered();
        self.clock += elapsed;
        self.timer.record(elapsed);

        let before = self.session.packets();
        self.session.pump();
        self.stats.packets += self.session.packets() - before;

        let viewport = self.renderer.viewport();
        let output = self.renderer.render(&self.session.scene(viewport));

        let dt = elapsed.min(self.max_dt).as_secs_f32();
        if self.session.update(dt).is_some() {
            self.stats.moves_sent += 1;
        }

        if self.animation.poll(self.clock) {
            self.session.animate(self.clock);
            self.stats.animation_ticks += 1;
        }
        if self.heartbeat.poll(self.clock) {
            self.session.heartbeat();
            self.stats.heartbeats += 1;
        }

        self.tally();
        self.stats.frames += 1;
        output
    }

    /// Run `frames` frames of exactly `period` each.
    pub fn run(&mut self, frames: usize, period: Duration) -> Vec<R::Output> {
        (0..frames).map(|_| self.frame(period)).collect()
    }

    fn tally(&mut self) {
        for event in self.session.world_mut().drain_events() {
            match event {
                WorldEvent::Warning(_) => self.stats.warnings += 1,
                WorldEvent::Evicted { entities, chunks } => {
                    self.stats.evicted_entities += entities as u64;
                    self.stats.evicted_chunks += chunks as u64;
                }
                _ => {}
            }
        }
    }

    pub fn session(&self) -> &Session<T> {
        &self.session
    }

    pub fn session_mut(&mut self) -> &mut Session<T> {
        &mut self.session
    }

    pub fn renderer(&self) -> &R {
        &self.renderer
    }

    pub fn renderer_mut(&mut self) -> &mut R {
        &mut self.renderer
    }

    /// Session time: the sum of all frame durations so far.
    pub fn clock(&self) -> Duration {
        self.clock
    }

    pub fn timer(&self) -> &FrameTimer {
        &self.timer
    }

    pub fn stats(&self) -> &SessionStats {
        &self.stats
    }

    pub fn into_parts(self) -> (Session<T>, R) {
        (self.session, self.renderer)
    }
}
