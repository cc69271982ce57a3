//! Presentation of ranked products. Renderers never reorder their input.

use affinity_core::recommend::RankedProduct;
use serde::Serialize;

const BANNER_WIDTH: usize = 46;

pub trait RecommendationDisplay {
    fn render(&self, user_id: &str, ranked: &[RankedProduct]) -> String;
}

/// Plain-text banner listing, one product per line
#[derive(Debug, Clone, Copy, Default)]
pub struct TextDisplay;

impl RecommendationDisplay for TextDisplay {
    fn render(&self, user_id: &str, ranked: &[RankedProduct]) -> String {
        let mut lines = Vec::with_capacity(ranked.len() + 2);
        lines.push(format!("===== RECOMMENDATIONS FOR {} =====", user_id.to_uppercase()));
        for entry in ranked {
            lines.push(format!("- {} (score: {:.3})", entry.product_id, entry.score));
        }
        lines.push("=".repeat(BANNER_WIDTH));
        lines.join("\n")
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct JsonDisplay;

#[derive(Serialize)]
struct JsonRecommendations<'a> {
    user: &'a str,
    recommendations: &'a [RankedProduct],
}

impl RecommendationDisplay for JsonDisplay {
    fn render(&self, user_id: &str, ranked: &[RankedProduct]) -> String {
        let payload = JsonRecommendations { user: user_id, recommendations: ranked };
        serde_json::to_string_pretty(&payload).unwrap_or_else(|error| {
            format!(
                "{{\"user\":\"{}\",\"error\":\"{}\"}}",
                escape_json(user_id),
                escape_json(&error.to_string())
            )
        })
    }
}

fn escape_json(value: &str) -> String {
    value.replace('\\', "\\\\").replace('"', "\\\"")
}
