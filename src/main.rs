use anyhow::{Context, Result};

use skydeck_weather::forecast::day_label;
use skydeck_weather::{
    condition_label, format_temperature, format_time, is_extreme_weather, temperature_color,
    DashboardSnapshot, TemperatureUnit,
};

struct Args {
    json: bool,
    unit: Option<TemperatureUnit>,
    add: Vec<String>,
}

fn parse_args() -> Result<Args> {
    let mut args = Args {
        json: false,
        unit: None,
        add: Vec::new(),
    };

    let mut iter = std::env::args().skip(1);
    while let Some(arg) = iter.next() {
        match arg.as_str() {
            "--json" => args.json = true,
            "--fahrenheit" => args.unit = Some(TemperatureUnit::Fahrenheit),
            "--celsius" => args.unit = Some(TemperatureUnit::Celsius),
            "--add" => {
                let city = iter.next().context("--add needs a city name")?;
                args.add.push(city);
            }
            other => anyhow::bail!("Unknown argument: {}", other),
        }
    }

    Ok(args)
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = parse_args()?;

    // Initialize core
    skydeck_core::init()?;

    let mut app = skydeck_core::App::new()?;
    if let Some(unit) = args.unit {
        app.dashboard_mut().set_unit(unit);
    }
    app.initialize().await?;

    for query in &args.add {
        if let Err(e) = app.add_city(query) {
            tracing::warn!("Could not add {}: {}", query, e);
            eprintln!("{}", e.user_message());
        }
    }

    let snapshot = app.dashboard().snapshot();
    if args.json {
        let json = serde_json::to_string_pretty(&snapshot).context("Failed to render JSON")?;
        println!("{}", json);
    } else {
        render(&snapshot);
    }

    app.shutdown()?;
    Ok(())
}

fn render(snapshot: &DashboardSnapshot) {
    let unit = snapshot.unit;

    println!("SkyDeck Weather");
    if let Some(error) = &snapshot.error {
        println!("  ! {}", error);
    }

    println!("\nCities");
    if snapshot.cities.is_empty() {
        println!("  No cities tracked. Use --add <city> to add one.");
    }
    for city in &snapshot.cities {
        let flag = if is_extreme_weather(city) { "  [extreme]" } else { "" };
        println!(
            "  {} {}, {}  {} ({})  {}{}",
            city.icon,
            city.city,
            city.country,
            format_temperature(f64::from(city.temperature), unit),
            temperature_color(f64::from(city.temperature)).token(),
            condition_label(&city.condition),
            flag,
        );
        println!(
            "     humidity {}%  wind {} km/h  updated {}",
            city.humidity,
            city.wind_speed,
            format_time(city.last_updated),
        );
    }

    if !snapshot.forecast.is_empty() {
        println!("\n5-Day Forecast");
        for (i, day) in snapshot.forecast.iter().enumerate() {
            let precip = if day.shows_precipitation() {
                format!("  {}% rain", day.precipitation)
            } else {
                String::new()
            };
            println!(
                "  {:<12} {} {} / {}{}",
                day_label(i, day),
                day.icon,
                format_temperature(f64::from(day.high), unit),
                format_temperature(f64::from(day.low), unit),
                precip,
            );
        }
    }

    let stats = &snapshot.stats;
    println!("\nQuick Stats");
    println!("  Cities tracked: {}", stats.cities_tracked);
    println!("  Avg temperature: {}", stats.average_display(unit));
    if let Some(updated) = stats.last_updated {
        println!("  Last updated: {}", format_time(updated));
    }
    println!("  Extreme conditions: {}", stats.extreme_count);

    let active: Vec<_> = snapshot.alerts.iter().filter(|a| a.is_active).collect();
    if !active.is_empty() {
        println!("\nWeather Alerts");
        for alert in active {
            println!("  {}: {}", alert.title, alert.description);
        }
    }
}
