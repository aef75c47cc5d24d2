//! Display strings derived from panel state. Everything here is a pure
//! function of its input.

use chrono::{DateTime, TimeZone};

use crate::{
    model::{LogEntry, WeatherSnapshot, WindowAction},
    state::{DeviceView, PanelState},
};

pub const PLACEHOLDER: &str = "--";

pub fn temperature_label(temperature_c: Option<f64>) -> String {
    match temperature_c {
        Some(t) => format!("{t:.1}°C"),
        None => PLACEHOLDER.to_string(),
    }
}

pub fn sky_label(sky: Option<&str>) -> String {
    match sky {
        Some(s) if !s.trim().is_empty() => s.to_string(),
        _ => PLACEHOLDER.to_string(),
    }
}

/// Probability is preferred over the hourly amount.
pub fn precipitation_label(weather: Option<&WeatherSnapshot>) -> String {
    let Some(w) = weather else {
        return PLACEHOLDER.to_string();
    };

    if let Some(prob) = w.precipitation_probability_pct {
        format!("{prob}%")
    } else if let Some(mm) = w.precipitation_1h_mm {
        format!("{mm} mm")
    } else {
        PLACEHOLDER.to_string()
    }
}

pub fn pm25_label(pm25: Option<f64>) -> String {
    match pm25 {
        Some(v) => format!("{v} μg/m³"),
        None => PLACEHOLDER.to_string(),
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AirQuality {
    Unknown,
    Good,
    Moderate,
    Bad,
    VeryBad,
}

impl AirQuality {
    /// Buckets: ≤15, ≤35, ≤75, above.
    pub fn from_pm25(pm25: Option<f64>) -> Self {
        match pm25 {
            None => AirQuality::Unknown,
            Some(v) if v <= 15.0 => AirQuality::Good,
            Some(v) if v <= 35.0 => AirQuality::Moderate,
            Some(v) if v <= 75.0 => AirQuality::Bad,
            Some(_) => AirQuality::VeryBad,
        }
    }

    pub fn emoji(&self) -> &'static str {
        match self {
            AirQuality::Unknown => "🙂",
            AirQuality::Good => "😊",
            AirQuality::Moderate => "😐",
            AirQuality::Bad => "😷",
            AirQuality::VeryBad => "🤢",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            AirQuality::Unknown => "데이터 없음",
            AirQuality::Good => "미세먼지 좋음",
            AirQuality::Moderate => "미세먼지 보통",
            AirQuality::Bad => "미세먼지 나쁨",
            AirQuality::VeryBad => "매우 나쁨",
        }
    }
}

/// Window recommendation, highest priority first. Visibility and message
/// both come from the same variant, so they cannot disagree.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Recommendation {
    DustVeryHigh,
    DustHigh,
    RainLikely,
    RainDetected,
    Quiet,
}

impl Recommendation {
    pub fn for_weather(weather: Option<&WeatherSnapshot>) -> Self {
        let Some(w) = weather else {
            return Recommendation::Quiet;
        };

        let pm = w.pm25.unwrap_or(0.0);
        let prob = w.precipitation_probability_pct.unwrap_or(0.0);
        let mm = w.precipitation_1h_mm.unwrap_or(0.0);

        if pm >= 75.0 {
            Recommendation::DustVeryHigh
        } else if pm >= 35.0 {
            Recommendation::DustHigh
        } else if prob >= 60.0 {
            Recommendation::RainLikely
        } else if mm >= 1.0 {
            Recommendation::RainDetected
        } else {
            Recommendation::Quiet
        }
    }

    pub fn show(&self) -> bool {
        !matches!(self, Recommendation::Quiet)
    }

    pub fn message(&self) -> &'static str {
        match self {
            Recommendation::DustVeryHigh => "미세먼지가 매우 높습니다. 창문 닫기를 권장합니다.",
            Recommendation::DustHigh => "미세먼지 농도가 높습니다. 환기에 주의하세요.",
            Recommendation::RainLikely => "강수 확률이 높습니다. 창문을 닫아주세요.",
            Recommendation::RainDetected => "강수량이 감지되고 있습니다.",
            Recommendation::Quiet => "",
        }
    }
}

pub fn status_line(device: &DeviceView) -> String {
    match device {
        DeviceView::Checking => "시스템 상태 확인 중...".to_string(),
        DeviceView::Connected(status) => format!("현재 상태: {}", status.state.label()),
        DeviceView::Error(_) => "시스템 연결 오류 (ESP32 미응답)".to_string(),
    }
}

pub fn rain_notice(device: &DeviceView) -> Option<&'static str> {
    match device {
        DeviceView::Connected(status) if status.auto_closed_by_rain => Some("빗물 감지로 자동 닫힘"),
        _ => None,
    }
}

/// Header clock, e.g. `2026/10/18 03:04:05 PM`.
pub fn clock_label<Tz: TimeZone>(now: &DateTime<Tz>) -> String
where
    Tz::Offset: std::fmt::Display,
{
    now.format("%Y/%m/%d %I:%M:%S %p").to_string()
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ActionButton {
    pub action: WindowAction,
    pub caption: &'static str,
    pub enabled: bool,
}

pub fn action_buttons(busy: Option<WindowAction>) -> Vec<ActionButton> {
    WindowAction::all()
        .iter()
        .map(|&action| ActionButton {
            action,
            caption: if busy == Some(action) {
                "전송중..."
            } else {
                action.caption()
            },
            enabled: busy.is_none(),
        })
        .collect()
}

/// Everything the panel shows, flattened to strings.
#[derive(Debug, Clone, PartialEq)]
pub struct PanelView {
    pub location_input: String,
    pub search_button: &'static str,
    pub suggestions: Vec<String>,
    pub weather_error: Option<String>,
    pub title: String,
    pub air: AirQuality,
    pub temperature: String,
    pub sky: String,
    pub precipitation: String,
    pub pm25: String,
    pub recommendation: Recommendation,
    pub buttons: Vec<ActionButton>,
    pub log: Vec<LogEntry>,
    pub status_line: String,
    pub rain_notice: Option<&'static str>,
}

impl PanelView {
    pub fn from_state(state: &PanelState) -> Self {
        let weather = state.weather.as_ref();

        let suggestions = if state.show_suggestions {
            state.suggestions.iter().map(|s| s.name.clone()).collect()
        } else {
            Vec::new()
        };

        Self {
            location_input: state.location_input.clone(),
            search_button: if state.weather_loading { "조회중..." } else { "조회" },
            suggestions,
            weather_error: state.weather_error.clone(),
            title: state.display_location.clone(),
            air: AirQuality::from_pm25(weather.and_then(|w| w.pm25)),
            temperature: temperature_label(weather.and_then(|w| w.temperature_c)),
            sky: sky_label(weather.and_then(|w| w.sky_condition.as_deref())),
            precipitation: precipitation_label(weather),
            pm25: pm25_label(weather.and_then(|w| w.pm25)),
            recommendation: Recommendation::for_weather(weather),
            buttons: action_buttons(state.busy),
            log: state.log.iter().cloned().collect(),
            status_line: status_line(&state.device),
            rain_notice: rain_notice(&state.device),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{DeviceStatus, RegionSuggestion, WindowState};
    use chrono::{FixedOffset, TimeZone};

    fn weather(pm25: Option<f64>, prob: Option<f64>, mm: Option<f64>) -> WeatherSnapshot {
        WeatherSnapshot {
            location_name: "광주광역시".into(),
            temperature_c: None,
            sky_condition: None,
            precipitation_probability_pct: prob,
            precipitation_1h_mm: mm,
            pm25,
        }
    }

    #[test]
    fn placeholders_for_missing_values() {
        assert_eq!(temperature_label(None), "--");
        assert_eq!(sky_label(None), "--");
        assert_eq!(sky_label(Some("")), "--");
        assert_eq!(precipitation_label(None), "--");
        assert_eq!(precipitation_label(Some(&weather(None, None, None))), "--");
        assert_eq!(pm25_label(None), "--");
    }

    #[test]
    fn formatted_values() {
        assert_eq!(temperature_label(Some(21.54)), "21.5°C");
        assert_eq!(temperature_label(Some(-3.0)), "-3.0°C");
        assert_eq!(pm25_label(Some(80.0)), "80 μg/m³");
        assert_eq!(precipitation_label(Some(&weather(None, Some(60.0), Some(2.5)))), "60%");
        assert_eq!(precipitation_label(Some(&weather(None, None, Some(2.5)))), "2.5 mm");
    }

    #[test]
    fn air_quality_buckets() {
        assert_eq!(AirQuality::from_pm25(None), AirQuality::Unknown);
        assert_eq!(AirQuality::from_pm25(Some(15.0)), AirQuality::Good);
        assert_eq!(AirQuality::from_pm25(Some(15.1)), AirQuality::Moderate);
        assert_eq!(AirQuality::from_pm25(Some(35.0)), AirQuality::Moderate);
        assert_eq!(AirQuality::from_pm25(Some(75.0)), AirQuality::Bad);
        assert_eq!(AirQuality::from_pm25(Some(80.0)), AirQuality::VeryBad);
        assert_eq!(AirQuality::VeryBad.label(), "매우 나쁨");
    }

    #[test]
    fn recommendation_priority() {
        let r = |pm, prob, mm| Recommendation::for_weather(Some(&weather(pm, prob, mm)));

        assert_eq!(r(Some(75.0), Some(90.0), Some(5.0)), Recommendation::DustVeryHigh);
        assert_eq!(r(Some(35.0), Some(90.0), None), Recommendation::DustHigh);
        assert_eq!(r(Some(34.9), Some(60.0), Some(5.0)), Recommendation::RainLikely);
        assert_eq!(r(None, Some(59.0), Some(1.0)), Recommendation::RainDetected);
        assert_eq!(r(None, Some(59.0), Some(0.9)), Recommendation::Quiet);
        assert_eq!(Recommendation::for_weather(None), Recommendation::Quiet);
    }

    #[test]
    fn banner_show_matches_message() {
        let values = [
            None,
            Some(0.0),
            Some(0.9),
            Some(1.0),
            Some(34.9),
            Some(35.0),
            Some(59.9),
            Some(60.0),
            Some(75.0),
            Some(120.0),
        ];

        for pm in values {
            for prob in values {
                for mm in values {
                    let rec = Recommendation::for_weather(Some(&weather(pm, prob, mm)));
                    let expected_show = pm.unwrap_or(0.0) >= 35.0
                        || prob.unwrap_or(0.0) >= 60.0
                        || mm.unwrap_or(0.0) >= 1.0;

                    assert_eq!(rec.show(), expected_show, "pm={pm:?} prob={prob:?} mm={mm:?}");
                    assert_eq!(rec.show(), !rec.message().is_empty());
                }
            }
        }
    }

    #[test]
    fn status_lines() {
        assert_eq!(status_line(&DeviceView::Checking), "시스템 상태 확인 중...");
        assert_eq!(
            status_line(&DeviceView::Error("timeout".into())),
            "시스템 연결 오류 (ESP32 미응답)"
        );

        let closed = DeviceView::Connected(DeviceStatus {
            state: WindowState::Closed,
            auto_closed_by_rain: true,
            rain_level: Some(900.0),
        });
        assert_eq!(status_line(&closed), "현재 상태: 닫힘");
        assert_eq!(rain_notice(&closed), Some("빗물 감지로 자동 닫힘"));
        assert_eq!(rain_notice(&DeviceView::Checking), None);
    }

    #[test]
    fn clock_uses_twelve_hour_format() {
        let tz = FixedOffset::east_opt(9 * 3600).unwrap();
        let at = tz.with_ymd_and_hms(2026, 10, 18, 15, 4, 5).unwrap();
        assert_eq!(clock_label(&at), "2026/10/18 03:04:05 PM");

        let midnight = tz.with_ymd_and_hms(2026, 1, 2, 0, 0, 9).unwrap();
        assert_eq!(clock_label(&midnight), "2026/01/02 12:00:09 AM");
    }

    #[test]
    fn buttons_disable_together_while_busy() {
        let idle = action_buttons(None);
        assert!(idle.iter().all(|b| b.enabled));
        assert_eq!(
            idle.iter().map(|b| b.caption).collect::<Vec<_>>(),
            vec!["열기", "정지", "닫기"]
        );

        let busy = action_buttons(Some(WindowAction::Stop));
        assert!(busy.iter().all(|b| !b.enabled));
        assert_eq!(busy[1].caption, "전송중...");
        assert_eq!(busy[0].caption, "열기");
    }

    #[test]
    fn seoul_scenario_view() {
        let mut state = PanelState::new("광주광역시");
        let query = state.edit_input("서울").unwrap();
        state.apply_regions(
            query,
            Ok(vec![RegionSuggestion {
                name: "서울특별시".into(),
                region_id: "11".into(),
            }]),
        );
        assert_eq!(PanelView::from_state(&state).suggestions, vec!["서울특별시"]);

        let ticket = state.select_suggestion_at(0).unwrap();
        assert_eq!(PanelView::from_state(&state).search_button, "조회중...");

        state.apply_weather(
            ticket,
            Ok(WeatherSnapshot {
                location_name: "서울특별시".into(),
                temperature_c: Some(21.5),
                sky_condition: Some("맑음".into()),
                precipitation_probability_pct: None,
                precipitation_1h_mm: None,
                pm25: Some(80.0),
            }),
        );

        let view = PanelView::from_state(&state);
        assert_eq!(view.title, "서울특별시");
        assert!(view.suggestions.is_empty());
        assert!(view.recommendation.show());
        assert!(view.recommendation.message().contains("매우 높습니다"));
        assert_eq!(view.air, AirQuality::VeryBad);
        assert_eq!(view.temperature, "21.5°C");
        assert_eq!(view.sky, "맑음");
        assert_eq!(view.precipitation, "--");
        assert_eq!(view.search_button, "조회");
    }
}
