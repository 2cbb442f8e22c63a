use std::fmt;

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Names {
    pub international: String,
    #[serde(default)]
    pub japanese: Option<String>,
}

/// A `{rel, uri}` pair from a record's `links` list or a pagination block.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Link {
    pub rel: String,
    pub uri: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Uri {
    pub uri: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Asset {
    #[serde(default)]
    pub uri: Option<String>,
    #[serde(default)]
    pub width: Option<u32>,
    #[serde(default)]
    pub height: Option<u32>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Color {
    pub light: String,
    pub dark: String,
}

/// How a user's name is rendered on the site, keyed by `style`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "style", rename_all = "lowercase")]
pub enum NameStyle {
    Gradient {
        #[serde(rename = "color-from")]
        color_from: Color,
        #[serde(rename = "color-to")]
        color_to: Color,
    },
    Solid {
        color: Color,
    },
}

/// Any lookup entity the API only describes by id and name (platforms,
/// regions, genres, engines, developers, publishers, game types).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NamedEntity {
    pub id: String,
    pub name: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TimingMethod {
    Realtime,
    RealtimeNoloads,
    Ingame,
}

impl fmt::Display for TimingMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            TimingMethod::Realtime => "realtime",
            TimingMethod::RealtimeNoloads => "realtime_noloads",
            TimingMethod::Ingame => "ingame",
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Direction {
    Asc,
    Desc,
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Direction::Asc => "asc",
            Direction::Desc => "desc",
        })
    }
}

/// The `{"data": ...}` wrapper the API puts around embedded resources.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Embedded<T> {
    pub data: T,
}

/// A field that holds a reference (usually an id) unless the matching
/// resource was requested with `embed`, in which case the API inlines it as
/// `{"data": ...}`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum MaybeEmbedded<R, T> {
    Embedded { data: T },
    Reference(R),
}

impl<R, T> MaybeEmbedded<R, T> {
    pub fn reference(&self) -> Option<&R> {
        match self {
            MaybeEmbedded::Reference(r) => Some(r),
            MaybeEmbedded::Embedded { .. } => None,
        }
    }

    pub fn embedded(&self) -> Option<&T> {
        match self {
            MaybeEmbedded::Embedded { data } => Some(data),
            MaybeEmbedded::Reference(_) => None,
        }
    }
}

impl<R: Default, T> Default for MaybeEmbedded<R, T> {
    fn default() -> Self {
        MaybeEmbedded::Reference(R::default())
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn name_style_dispatches_on_style() {
        let solid: NameStyle = serde_json::from_value(json!({
            "style": "solid",
            "color": {"light": "#EE4444", "dark": "#EE4444"}
        }))
        .unwrap();
        assert!(matches!(solid, NameStyle::Solid { .. }));

        let gradient: NameStyle = serde_json::from_value(json!({
            "style": "gradient",
            "color-from": {"light": "#8A5A00", "dark": "#FFB3F3"},
            "color-to": {"light": "#6B3E00", "dark": "#E5E500"}
        }))
        .unwrap();
        match gradient {
            NameStyle::Gradient { color_to, .. } => assert_eq!(color_to.dark, "#E5E500"),
            other => panic!("expected gradient, got {other:?}"),
        }
    }

    #[test]
    fn unknown_name_style_is_rejected() {
        let result: Result<NameStyle, _> = serde_json::from_value(json!({
            "style": "rainbow",
            "color": {"light": "#000000", "dark": "#FFFFFF"}
        }));
        assert!(result.is_err());
    }

    #[test]
    fn gradient_missing_a_color_is_rejected() {
        let result: Result<NameStyle, _> = serde_json::from_value(json!({
            "style": "gradient",
            "color-from": {"light": "#000000", "dark": "#FFFFFF"}
        }));
        assert!(result.is_err());
    }

    #[test]
    fn maybe_embedded_accepts_both_shapes() {
        let reference: MaybeEmbedded<String, NamedEntity> =
            serde_json::from_value(json!("8gej2n93")).unwrap();
        assert_eq!(reference.reference().map(String::as_str), Some("8gej2n93"));

        let embedded: MaybeEmbedded<String, NamedEntity> =
            serde_json::from_value(json!({"data": {"id": "8gej2n93", "name": "PC"}})).unwrap();
        assert_eq!(embedded.embedded().map(|p| p.name.as_str()), Some("PC"));
    }

    #[test]
    fn timing_method_uses_wire_names() {
        let timing: TimingMethod = serde_json::from_value(json!("realtime_noloads")).unwrap();
        assert_eq!(timing, TimingMethod::RealtimeNoloads);
        assert_eq!(timing.to_string(), "realtime_noloads");
    }
}
