//! The panel's single owned state aggregate.
//!
//! Every remote call is split into a `begin_*` step that hands out a ticket
//! and an `apply_*`/`finish_*` step that consumes it. Tickets carry the
//! counter value current when the request was issued, so a response that has
//! been superseded is recognised and dropped when it completes.

use tracing::{debug, info, warn};

use crate::{
    DeviceError, ServerError,
    activity::ActivityLog,
    model::{CommandReply, DeviceStatus, RegionSuggestion, WeatherSnapshot, WindowAction},
};

pub const NOT_FOUND_MESSAGE: &str = "해당 위치의 날씨 정보를 찾을 수 없습니다. 예: 광주광역시, 서울특별시";
pub const UNAVAILABLE_MESSAGE: &str = "날씨 정보를 불러오지 못했습니다.";
pub const EMPTY_QUERY_MESSAGE: &str = "지역을 입력해 주세요. 예: 광주광역시, 서울특별시";

/// Connection state of the status line.
#[derive(Debug, Clone, PartialEq, Default)]
pub enum DeviceView {
    #[default]
    Checking,
    Connected(DeviceStatus),
    /// Last poll failed; holds the failure reason.
    Error(String),
}

/// Issued for each weather lookup. Only tickets from the current location
/// epoch are applied.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WeatherTicket {
    epoch: u64,
    pub location: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RegionTicket {
    generation: u64,
    pub query: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StatusTicket {
    seq: u64,
}

/// Proof that the busy flag was taken for `action`.
#[derive(Debug, PartialEq, Eq)]
pub struct CommandTicket {
    pub action: WindowAction,
}

#[derive(Debug, Clone)]
pub struct PanelState {
    pub location_input: String,
    pub selected_region: Option<String>,
    pub last_searched: String,
    pub display_location: String,

    pub weather: Option<WeatherSnapshot>,
    pub weather_loading: bool,
    pub weather_error: Option<String>,

    pub suggestions: Vec<RegionSuggestion>,
    pub show_suggestions: bool,

    pub busy: Option<WindowAction>,
    pub device: DeviceView,
    pub log: ActivityLog,

    weather_epoch: u64,
    region_generation: u64,
    status_issued: u64,
    status_applied: u64,
    status_error_logged: bool,
}

impl PanelState {
    pub fn new(default_location: &str) -> Self {
        Self {
            location_input: default_location.to_string(),
            selected_region: None,
            last_searched: default_location.to_string(),
            display_location: default_location.to_string(),
            weather: None,
            weather_loading: false,
            weather_error: None,
            suggestions: Vec::new(),
            show_suggestions: false,
            busy: None,
            device: DeviceView::Checking,
            log: ActivityLog::default(),
            weather_epoch: 0,
            region_generation: 0,
            status_issued: 0,
            status_applied: 0,
            status_error_logged: false,
        }
    }

    // --- region autocomplete

    /// Record an edit of the location input. Returns the query to debounce,
    /// or `None` when the input is blank (suggestions are cleared at once).
    pub fn edit_input(&mut self, text: &str) -> Option<RegionTicket> {
        self.location_input = text.to_string();
        self.selected_region = None;
        self.region_generation += 1;

        let query = text.trim();
        if query.is_empty() {
            self.suggestions.clear();
            self.show_suggestions = false;
            return None;
        }

        self.show_suggestions = true;
        Some(RegionTicket {
            generation: self.region_generation,
            query: query.to_string(),
        })
    }

    /// Returns `true` when the result was applied.
    pub fn apply_regions(
        &mut self,
        ticket: RegionTicket,
        result: Result<Vec<RegionSuggestion>, ServerError>,
    ) -> bool {
        if ticket.generation != self.region_generation {
            debug!(query = %ticket.query, "dropping stale region results");
            return false;
        }

        self.suggestions = match result {
            Ok(list) => list,
            Err(e) => {
                warn!(query = %ticket.query, error = %e, "region search failed");
                Vec::new()
            }
        };

        true
    }

    /// Accept a suggestion: it becomes the input and the displayed location,
    /// suggestions close, and a weather search for it starts.
    pub fn select_suggestion(&mut self, name: &str) -> WeatherTicket {
        self.location_input = name.to_string();
        self.selected_region = Some(name.to_string());
        self.display_location = name.to_string();
        self.suggestions.clear();
        self.show_suggestions = false;
        self.region_generation += 1;

        self.begin_weather_search(name)
    }

    /// Select by position in the current suggestion list.
    pub fn select_suggestion_at(&mut self, index: usize) -> Option<WeatherTicket> {
        let name = self.suggestions.get(index)?.name.clone();
        Some(self.select_suggestion(&name))
    }

    // --- weather

    /// Explicit search button. Uses the accepted suggestion if there is one,
    /// otherwise the typed text.
    pub fn submit_search(&mut self) -> Option<WeatherTicket> {
        let base = self
            .selected_region
            .as_deref()
            .unwrap_or(&self.location_input)
            .trim()
            .to_string();

        if base.is_empty() {
            self.weather_error = Some(EMPTY_QUERY_MESSAGE.to_string());
            return None;
        }

        self.display_location = base.clone();
        Some(self.begin_weather_search(&base))
    }

    /// Switch to a new location. Any lookup issued before this is stale.
    pub fn begin_weather_search(&mut self, location: &str) -> WeatherTicket {
        let location = location.trim().to_string();
        info!(%location, "weather search");

        self.weather_epoch += 1;
        self.last_searched = location.clone();
        self.weather_loading = true;
        self.weather_error = None;

        WeatherTicket {
            epoch: self.weather_epoch,
            location,
        }
    }

    /// Periodic refresh of the current location.
    pub fn begin_weather_refresh(&mut self) -> Option<WeatherTicket> {
        let location = self.last_searched.trim();
        if location.is_empty() {
            return None;
        }

        let ticket = WeatherTicket {
            epoch: self.weather_epoch,
            location: location.to_string(),
        };
        self.weather_loading = true;
        self.weather_error = None;

        Some(ticket)
    }

    /// Returns `true` when the result was applied.
    pub fn apply_weather(
        &mut self,
        ticket: WeatherTicket,
        result: Result<WeatherSnapshot, ServerError>,
    ) -> bool {
        if ticket.epoch != self.weather_epoch {
            debug!(location = %ticket.location, "dropping superseded weather result");
            return false;
        }

        match result {
            Ok(snapshot) => {
                self.display_location = snapshot.location_name.clone();
                self.weather = Some(snapshot);
            }
            Err(e) => {
                warn!(location = %ticket.location, error = %e, "weather lookup failed");
                self.weather = None;
                self.weather_error = Some(
                    match e {
                        ServerError::LocationNotFound => NOT_FOUND_MESSAGE,
                        ServerError::ServiceUnavailable(_) => UNAVAILABLE_MESSAGE,
                    }
                    .to_string(),
                );
                self.display_location = ticket.location;
            }
        }
        self.weather_loading = false;

        true
    }

    // --- device commands

    /// Take the busy flag for `action`. `None` means another command is in
    /// flight and nothing should be sent.
    pub fn begin_command(&mut self, action: WindowAction) -> Option<CommandTicket> {
        if let Some(current) = self.busy {
            debug!(%action, %current, "command ignored while another is in flight");
            return None;
        }

        self.busy = Some(action);
        self.log.info(format!("{} 명령 전송 중...", action.label()));

        Some(CommandTicket { action })
    }

    /// Record the outcome and release the busy flag.
    pub fn finish_command(
        &mut self,
        ticket: CommandTicket,
        result: Result<CommandReply, DeviceError>,
    ) {
        let label = ticket.action.label();

        match result {
            Ok(reply) => {
                let message = reply.message.unwrap_or_else(|| "응답 수신".to_string());
                info!(action = %ticket.action, %message, "command succeeded");
                self.log.info(format!("{label} 성공: {message}"));
            }
            Err(e) => {
                warn!(action = %ticket.action, error = %e, "command failed");
                self.log.error(format!("{label} 실패: {e}"));
            }
        }

        self.busy = None;
    }

    // --- device status

    pub fn begin_status_poll(&mut self) -> StatusTicket {
        self.status_issued += 1;
        StatusTicket {
            seq: self.status_issued,
        }
    }

    /// Returns `true` when the result was applied. A failure logs once per
    /// unbroken failure streak.
    pub fn apply_status(
        &mut self,
        ticket: StatusTicket,
        result: Result<DeviceStatus, DeviceError>,
    ) -> bool {
        if ticket.seq < self.status_applied {
            debug!(seq = ticket.seq, "dropping out-of-order status poll");
            return false;
        }
        self.status_applied = ticket.seq;

        match result {
            Ok(status) => {
                self.device = DeviceView::Connected(status);
                self.status_error_logged = false;
            }
            Err(e) => {
                let reason = e.to_string();
                if !self.status_error_logged {
                    warn!(error = %reason, "device status poll failed");
                    self.log.error(format!("ESP32 상태 조회 실패: {reason}"));
                    self.status_error_logged = true;
                }
                self.device = DeviceView::Error(reason);
            }
        }

        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{LogLevel, WindowState};

    fn snapshot(name: &str) -> WeatherSnapshot {
        WeatherSnapshot {
            location_name: name.to_string(),
            temperature_c: Some(21.5),
            sky_condition: Some("맑음".into()),
            precipitation_probability_pct: None,
            precipitation_1h_mm: None,
            pm25: Some(80.0),
        }
    }

    fn status(state: WindowState) -> DeviceStatus {
        DeviceStatus {
            state,
            auto_closed_by_rain: false,
            rain_level: None,
        }
    }

    #[test]
    fn starts_at_default_location_checking_device() {
        let state = PanelState::new("광주광역시");

        assert_eq!(state.display_location, "광주광역시");
        assert_eq!(state.last_searched, "광주광역시");
        assert_eq!(state.device, DeviceView::Checking);
        assert!(state.log.is_empty());
    }

    #[test]
    fn canonical_name_overrides_typed_input() {
        let mut state = PanelState::new("광주광역시");
        state.edit_input("  서울 ");
        let ticket = state.submit_search().unwrap();
        assert_eq!(ticket.location, "서울");
        assert!(state.weather_loading);

        assert!(state.apply_weather(ticket, Ok(snapshot("서울특별시"))));
        assert_eq!(state.display_location, "서울특별시");
        assert_eq!(state.location_input, "  서울 ");
        assert!(!state.weather_loading);
    }

    #[test]
    fn blank_search_sets_guidance_without_request() {
        let mut state = PanelState::new("광주광역시");
        state.edit_input("   ");

        assert!(state.submit_search().is_none());
        assert_eq!(state.weather_error.as_deref(), Some(EMPTY_QUERY_MESSAGE));
    }

    #[test]
    fn not_found_clears_snapshot_and_shows_guidance() {
        let mut state = PanelState::new("광주광역시");
        let first = state.begin_weather_search("광주광역시");
        state.apply_weather(first, Ok(snapshot("광주광역시")));

        let ticket = state.begin_weather_search("없는도시");
        state.apply_weather(ticket, Err(ServerError::LocationNotFound));

        assert!(state.weather.is_none());
        assert_eq!(state.weather_error.as_deref(), Some(NOT_FOUND_MESSAGE));
        assert_eq!(state.display_location, "없는도시");
    }

    #[test]
    fn unavailable_uses_generic_message() {
        let mut state = PanelState::new("광주광역시");
        let ticket = state.begin_weather_refresh().unwrap();
        state.apply_weather(ticket, Err(ServerError::ServiceUnavailable("502".into())));

        assert_eq!(state.weather_error.as_deref(), Some(UNAVAILABLE_MESSAGE));
    }

    #[test]
    fn refresh_superseded_by_search_is_dropped() {
        let mut state = PanelState::new("광주광역시");
        let refresh = state.begin_weather_refresh().unwrap();
        let search = state.begin_weather_search("서울특별시");

        assert!(state.apply_weather(search, Ok(snapshot("서울특별시"))));
        assert!(!state.apply_weather(refresh, Ok(snapshot("광주광역시"))));

        assert_eq!(state.display_location, "서울특별시");
        assert_eq!(state.weather.unwrap().location_name, "서울특별시");
    }

    #[test]
    fn refresh_within_same_location_applies() {
        let mut state = PanelState::new("광주광역시");
        let search = state.begin_weather_search("서울특별시");
        let refresh = state.begin_weather_refresh().unwrap();
        assert_eq!(refresh.location, "서울특별시");

        assert!(state.apply_weather(search, Ok(snapshot("서울특별시"))));
        assert!(state.apply_weather(refresh, Ok(snapshot("서울특별시"))));
    }

    #[test]
    fn blank_input_clears_suggestions_without_query() {
        let mut state = PanelState::new("광주광역시");
        let ticket = state.edit_input("서울").unwrap();
        state.apply_regions(
            ticket,
            Ok(vec![RegionSuggestion {
                name: "서울특별시".into(),
                region_id: "11".into(),
            }]),
        );
        assert_eq!(state.suggestions.len(), 1);

        assert!(state.edit_input("  ").is_none());
        assert!(state.suggestions.is_empty());
        assert!(!state.show_suggestions);
    }

    #[test]
    fn region_failure_degrades_to_empty_list_without_log() {
        let mut state = PanelState::new("광주광역시");
        let ticket = state.edit_input("부산").unwrap();

        assert!(state.apply_regions(ticket, Err(ServerError::ServiceUnavailable("down".into()))));
        assert!(state.suggestions.is_empty());
        assert!(state.weather_error.is_none());
        assert!(state.log.is_empty());
    }

    #[test]
    fn older_region_results_are_dropped() {
        let mut state = PanelState::new("광주광역시");
        let old = state.edit_input("서").unwrap();
        let new = state.edit_input("서울").unwrap();
        let seoul = RegionSuggestion {
            name: "서울특별시".into(),
            region_id: "11".into(),
        };

        assert!(state.apply_regions(new, Ok(vec![seoul.clone()])));
        assert!(!state.apply_regions(old, Ok(vec![])));
        assert_eq!(state.suggestions, vec![seoul]);
    }

    #[test]
    fn selecting_suggestion_sets_location_and_starts_search() {
        let mut state = PanelState::new("광주광역시");
        let query = state.edit_input("서울").unwrap();
        state.apply_regions(
            query.clone(),
            Ok(vec![RegionSuggestion {
                name: "서울특별시".into(),
                region_id: "11".into(),
            }]),
        );

        let ticket = state.select_suggestion_at(0).unwrap();

        assert_eq!(ticket.location, "서울특별시");
        assert_eq!(state.display_location, "서울특별시");
        assert_eq!(state.location_input, "서울특별시");
        assert!(state.suggestions.is_empty());
        assert!(!state.show_suggestions);
        // A late answer for the old query must not reopen the list.
        assert!(!state.apply_regions(query, Ok(vec![])));
        assert!(state.select_suggestion_at(0).is_none());
    }

    #[test]
    fn second_command_while_busy_is_rejected() {
        let mut state = PanelState::new("광주광역시");
        let ticket = state.begin_command(WindowAction::Open).unwrap();

        for action in WindowAction::all() {
            assert!(state.begin_command(*action).is_none());
        }
        assert_eq!(state.log.len(), 1);

        state.finish_command(
            ticket,
            Ok(CommandReply {
                ok: true,
                message: None,
            }),
        );
        assert_eq!(state.busy, None);
        assert!(state.begin_command(WindowAction::Close).is_some());
    }

    #[test]
    fn command_log_lines() {
        let mut state = PanelState::new("광주광역시");
        let ticket = state.begin_command(WindowAction::Close).unwrap();
        state.finish_command(ticket, Err(DeviceError::CommandFailed(500)));

        let lines: Vec<_> = state.log.iter().map(|e| (e.message.as_str(), e.level)).collect();
        assert_eq!(
            lines,
            vec![
                ("창문 닫기 실패: ESP32 command failed with status 500", LogLevel::Error),
                ("창문 닫기 명령 전송 중...", LogLevel::Info),
            ]
        );
        assert_eq!(state.busy, None);

        let ticket = state.begin_command(WindowAction::Open).unwrap();
        state.finish_command(
            ticket,
            Ok(CommandReply {
                ok: true,
                message: None,
            }),
        );
        assert_eq!(state.log.iter().next().unwrap().message, "창문 열기 성공: 응답 수신");
    }

    #[test]
    fn failure_streak_logs_once_and_success_resets() {
        let mut state = PanelState::new("광주광역시");

        for _ in 0..3 {
            let t = state.begin_status_poll();
            state.apply_status(t, Err(DeviceError::Unreachable("timeout".into())));
        }
        assert_eq!(state.log.count_level(LogLevel::Error), 1);
        assert!(matches!(state.device, DeviceView::Error(_)));

        let t = state.begin_status_poll();
        state.apply_status(t, Ok(status(WindowState::Open)));
        assert_eq!(state.device, DeviceView::Connected(status(WindowState::Open)));
        assert_eq!(state.log.count_level(LogLevel::Error), 1);

        let t = state.begin_status_poll();
        state.apply_status(t, Err(DeviceError::StatusFailed(500)));
        assert_eq!(state.log.count_level(LogLevel::Error), 2);
    }

    #[test]
    fn older_status_poll_does_not_overwrite_newer() {
        let mut state = PanelState::new("광주광역시");
        let first = state.begin_status_poll();
        let second = state.begin_status_poll();

        assert!(state.apply_status(second, Ok(status(WindowState::Closed))));
        assert!(!state.apply_status(first, Ok(status(WindowState::Opening))));
        assert_eq!(state.device, DeviceView::Connected(status(WindowState::Closed)));
    }
}
