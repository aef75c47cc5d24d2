//! The panel event loop.
//!
//! One task owns the [`PanelState`]. User events, the three timers and the
//! completions of spawned requests are multiplexed with `select!`; requests
//! run as separate tasks and only their results come back to the loop, so
//! state is never touched concurrently.

use std::future;

use tokio::{
    sync::mpsc,
    task::{JoinHandle, JoinSet},
    time::Interval,
};
use tracing::{debug, warn};

use crate::{
    Config, DeviceError, ServerError,
    config::Polling,
    display::PanelView,
    model::{CommandReply, DeviceStatus, RegionSuggestion, WeatherSnapshot, WindowAction},
    provider::{DeviceLink, RegionSearch, Services, WeatherLookup},
    schedule::{Debounce, poller},
    state::{CommandTicket, PanelState, RegionTicket, StatusTicket, WeatherTicket},
};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PanelEvent {
    /// The location input now reads this text.
    Input(String),
    /// Search button.
    Search,
    /// Accept a suggestion by name.
    Select(String),
    /// Accept a suggestion by its position in the list.
    Pick(usize),
    Command(WindowAction),
    Quit,
}

type CommandResult = Result<CommandReply, DeviceError>;
type PendingCommand = Option<(CommandTicket, JoinHandle<CommandResult>)>;

enum Completion {
    Weather(WeatherTicket, Result<WeatherSnapshot, ServerError>),
    Regions(RegionTicket, Result<Vec<RegionSuggestion>, ServerError>),
    Status(StatusTicket, Result<DeviceStatus, DeviceError>),
}

pub struct Panel {
    state: PanelState,
    services: Services,
    polling: Polling,
}

impl Panel {
    pub fn new(state: PanelState, services: Services, polling: Polling) -> Self {
        Self {
            state,
            services,
            polling,
        }
    }

    pub fn from_config(config: &Config, services: Services) -> Self {
        Self::new(
            PanelState::new(config.default_location()),
            services,
            config.polling.clone(),
        )
    }

    /// Run until `Quit` arrives or the event channel closes, calling `render`
    /// initially and whenever the view changes. Returns the final state;
    /// requests still in flight are abandoned.
    pub async fn run<F>(
        mut self,
        mut events: mpsc::Receiver<PanelEvent>,
        mut render: F,
    ) -> PanelState
    where
        F: FnMut(&PanelView),
    {
        let mut weather_tick = poller(self.polling.weather_refresh());
        let mut status_tick = poller(self.polling.status_poll());
        let mut debounce: Debounce<RegionTicket> = Debounce::new(self.polling.search_debounce());
        let mut inflight: JoinSet<Completion> = JoinSet::new();
        let mut command: PendingCommand = None;

        let mut last_view = PanelView::from_state(&self.state);
        render(&last_view);

        loop {
            tokio::select! {
                event = events.recv() => {
                    let Some(event) = event else {
                        debug!("event channel closed");
                        break;
                    };
                    if event == PanelEvent::Quit {
                        break;
                    }
                    self.handle_event(
                        event,
                        &mut debounce,
                        &mut weather_tick,
                        &mut inflight,
                        &mut command,
                    );
                }
                _ = weather_tick.tick() => {
                    if let Some(ticket) = self.state.begin_weather_refresh() {
                        spawn_weather(&self.services, &mut inflight, ticket);
                    }
                }
                _ = status_tick.tick() => {
                    let ticket = self.state.begin_status_poll();
                    let device = self.services.device.clone();
                    inflight.spawn(async move {
                        Completion::Status(ticket, device.fetch_status().await)
                    });
                }
                ticket = debounce.fired() => {
                    let regions = self.services.regions.clone();
                    inflight.spawn(async move {
                        let result = regions.search_regions(&ticket.query).await;
                        Completion::Regions(ticket, result)
                    });
                }
                (ticket, result) = join_command(&mut command) => {
                    self.state.finish_command(ticket, result);
                }
                Some(joined) = inflight.join_next(), if !inflight.is_empty() => {
                    match joined {
                        Ok(done) => self.complete(done),
                        Err(e) => warn!(error = %e, "request task failed"),
                    }
                }
            }

            let view = PanelView::from_state(&self.state);
            if view != last_view {
                render(&view);
                last_view = view;
            }
        }

        self.state
    }

    fn handle_event(
        &mut self,
        event: PanelEvent,
        debounce: &mut Debounce<RegionTicket>,
        weather_tick: &mut Interval,
        inflight: &mut JoinSet<Completion>,
        command: &mut PendingCommand,
    ) {
        match event {
            PanelEvent::Input(text) => match self.state.edit_input(&text) {
                Some(ticket) => debounce.schedule(ticket),
                None => debounce.cancel(),
            },
            PanelEvent::Search => {
                if let Some(ticket) = self.state.submit_search() {
                    spawn_weather(&self.services, inflight, ticket);
                    weather_tick.reset();
                }
            }
            PanelEvent::Select(name) => {
                debounce.cancel();
                let ticket = self.state.select_suggestion(&name);
                spawn_weather(&self.services, inflight, ticket);
                weather_tick.reset();
            }
            PanelEvent::Pick(index) => {
                debounce.cancel();
                match self.state.select_suggestion_at(index) {
                    Some(ticket) => {
                        spawn_weather(&self.services, inflight, ticket);
                        weather_tick.reset();
                    }
                    None => debug!(index, "no suggestion at index"),
                }
            }
            PanelEvent::Command(action) => {
                if let Some(ticket) = self.state.begin_command(action) {
                    let device = self.services.device.clone();
                    let handle = tokio::spawn(async move { device.send_command(action).await });
                    *command = Some((ticket, handle));
                }
            }
            PanelEvent::Quit => {}
        }
    }

    fn complete(&mut self, done: Completion) {
        match done {
            Completion::Weather(ticket, result) => {
                self.state.apply_weather(ticket, result);
            }
            Completion::Regions(ticket, result) => {
                self.state.apply_regions(ticket, result);
            }
            Completion::Status(ticket, result) => {
                self.state.apply_status(ticket, result);
            }
        }
    }
}

fn spawn_weather(services: &Services, inflight: &mut JoinSet<Completion>, ticket: WeatherTicket) {
    let weather = services.weather.clone();
    inflight.spawn(async move {
        let result = weather.fetch_weather(&ticket.location).await;
        Completion::Weather(ticket, result)
    });
}

/// Waits for the in-flight command, if any. A task that dies still yields a
/// result so the busy flag is always released.
async fn join_command(slot: &mut PendingCommand) -> (CommandTicket, CommandResult) {
    let Some((_, handle)) = slot.as_mut() else {
        return future::pending().await;
    };

    let result = handle
        .await
        .unwrap_or_else(|e| Err(DeviceError::Unreachable(format!("command task failed: {e}"))));

    match slot.take() {
        Some((ticket, _)) => (ticket, result),
        None => future::pending().await,
    }
}
