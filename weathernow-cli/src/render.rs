use chrono::NaiveDate;
use weathernow_core::{SearchState, WeatherView};

/// Render the search state as a plain-text card.
pub fn render(state: &SearchState, today: NaiveDate) -> String {
    if state.is_loading {
        return card(&["Loading weather..."]);
    }

    if let Some(error) = &state.error {
        return card(&["Weather Not Found", "", error]);
    }

    match &state.view {
        Some(view) => weather_card(view, today),
        None => card(&["Enter a City", "", "Search for a city to see the current weather"]),
    }
}

fn weather_card(view: &WeatherView, today: NaiveDate) -> String {
    let date = today.format("%A, %B %-d, %Y").to_string();
    let headline = format!("{}  {}°C", condition_glyph(&view.condition), view.temperature_c);
    let feels_like = format!("Feels like   {}°C", view.feels_like_c);
    let humidity = format!("Humidity     {}%", view.humidity_pct);
    let wind = format!("Wind         {} km/h", view.wind_speed_kmh);
    let visibility = format!("Visibility   {} km", view.visibility_km);

    let mut lines = vec![view.city.as_str()];
    if !view.country.is_empty() {
        lines.push(&view.country);
    }
    lines.extend([
        date.as_str(),
        "",
        headline.as_str(),
        view.condition.as_str(),
        "",
        feels_like.as_str(),
        humidity.as_str(),
        wind.as_str(),
        visibility.as_str(),
    ]);

    card(&lines)
}

/// Glyphs are single-column symbols so `card` can pad by char count.
fn condition_glyph(condition: &str) -> &'static str {
    let condition = condition.to_lowercase();
    if condition.contains("rain") || condition.contains("drizzle") {
        "☂"
    } else if condition.contains("snow") {
        "❄"
    } else if condition.contains("cloud") {
        "☁"
    } else {
        "☀"
    }
}

fn card(lines: &[&str]) -> String {
    let width = lines.iter().map(|l| l.chars().count()).max().unwrap_or(0);
    let rule = "─".repeat(width + 2);

    let mut out = format!("┌{rule}┐\n");
    for line in lines {
        let pad = width - line.chars().count();
        out.push_str(&format!("│ {line}{} │\n", " ".repeat(pad)));
    }
    out.push_str(&format!("└{rule}┘"));
    out
}
