//! Plain-text rendering of the panel and of one-shot command results.

use std::fmt::Write;

use window_core::{
    LogLevel, PanelView, WeatherSnapshot,
    display::{self, AirQuality, Recommendation},
};

const RULE: &str = "────────────────────────────────────────";

pub fn panel(view: &PanelView, clock: &str) -> String {
    let mut out = String::new();

    let _ = writeln!(out, "{RULE}");
    let _ = writeln!(out, "{clock}");
    let _ = writeln!(out, "위치 입력: {}  [{}]", view.location_input, view.search_button);
    for (i, name) in view.suggestions.iter().enumerate() {
        let _ = writeln!(out, "  {}. {name}", i + 1);
    }
    if let Some(err) = &view.weather_error {
        let _ = writeln!(out, "! {err}");
    }

    let _ = writeln!(out);
    let _ = writeln!(out, "  {}", view.title);
    let _ = writeln!(out, "  {} {}", view.air.emoji(), view.air.label());
    let _ = writeln!(out, "  ☁️ 기온 {}   🌥️ 하늘 {}", view.temperature, view.sky);
    let _ = writeln!(out, "  🌧️ 강수 {}   PM2.5 {}", view.precipitation, view.pm25);
    if view.recommendation.show() {
        let _ = writeln!(out, "  ⚠ {}", view.recommendation.message());
    }

    let _ = writeln!(out);
    let buttons: Vec<String> = view
        .buttons
        .iter()
        .map(|b| {
            if b.enabled {
                format!("[{}]", b.caption)
            } else {
                format!("({})", b.caption)
            }
        })
        .collect();
    let _ = writeln!(out, "  {}", buttons.join(" "));

    if view.log.is_empty() {
        let _ = writeln!(out, "  최근 로그 없음");
    }
    for entry in &view.log {
        let marker = match entry.level {
            LogLevel::Info => ' ',
            LogLevel::Error => '!',
        };
        let _ = writeln!(out, " {marker}[{}] {}", entry.time, entry.message);
    }

    let _ = writeln!(out, "{}", view.status_line);
    if let Some(notice) = view.rain_notice {
        let _ = writeln!(out, "{notice}");
    }

    out
}

/// Summary printed by `window weather`.
pub fn weather_card(snapshot: &WeatherSnapshot) -> String {
    let air = AirQuality::from_pm25(snapshot.pm25);
    let recommendation = Recommendation::for_weather(Some(snapshot));

    let mut out = String::new();
    let _ = writeln!(out, "{}", snapshot.location_name);
    let _ = writeln!(out, "{} {}", air.emoji(), air.label());
    let _ = writeln!(out, "기온  {}", display::temperature_label(snapshot.temperature_c));
    let _ = writeln!(out, "하늘  {}", display::sky_label(snapshot.sky_condition.as_deref()));
    let _ = writeln!(out, "강수  {}", display::precipitation_label(Some(snapshot)));
    let _ = writeln!(out, "PM2.5 {}", display::pm25_label(snapshot.pm25));
    if recommendation.show() {
        let _ = writeln!(out, "⚠ {}", recommendation.message());
    }

    out
}
