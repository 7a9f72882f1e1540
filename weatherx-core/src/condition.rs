/// Condition text used when a weather code is not part of the WMO table.
pub const UNKNOWN_CONDITION: &str = "Unknown";

/// Translates a WMO weather interpretation code (as returned by Open-Meteo)
/// into a short English description.
pub fn describe(code: i32) -> &'static str {
    match code {
        0 => "Clear Sky",

        1 => "Mainly Clear",
        2 => "Partly Cloudy",
        3 => "Overcast",

        45 => "Fog",
        48 => "Depositing Rime Fog",

        51 => "Light Drizzle",
        53 => "Moderate Drizzle",
        55 => "Dense Drizzle",
        56 => "Light Freezing Drizzle",
        57 => "Dense Freezing Drizzle",

        61 => "Slight Rain",
        63 => "Moderate Rain",
        65 => "Heavy Rain",
        66 => "Light Freezing Rain",
        67 => "Heavy Freezing Rain",

        71 => "Slight Snow",
        73 => "Moderate Snow",
        75 => "Heavy Snow",
        77 => "Snow Grains",

        80 => "Slight Rain Showers",
        81 => "Moderate Rain Showers",
        82 => "Violent Rain Showers",

        85 => "Slight Snow Showers",
        86 => "Heavy Snow Showers",

        95 => "Thunderstorm",
        96 => "Thunderstorm with Slight Hail",
        99 => "Thunderstorm with Heavy Hail",

        _ => UNKNOWN_CONDITION,
    }
}
