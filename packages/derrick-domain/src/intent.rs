/// The five retrieval-routing categories every query is classified into.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Intent {
	Procedure,
	Troubleshooting,
	Safety,
	AssetInfo,
	People,
}

impl Intent {
	pub const ALL: [Intent; 5] = [
		Intent::Procedure,
		Intent::Troubleshooting,
		Intent::Safety,
		Intent::AssetInfo,
		Intent::People,
	];

	pub fn as_str(self) -> &'static str {
		match self {
			Self::Procedure => "procedure",
			Self::Troubleshooting => "troubleshooting",
			Self::Safety => "safety",
			Self::AssetInfo => "asset_info",
			Self::People => "people",
		}
	}

	pub fn parse(label: &str) -> Option<Self> {
		match label.trim() {
			"procedure" => Some(Self::Procedure),
			"troubleshooting" => Some(Self::Troubleshooting),
			"safety" => Some(Self::Safety),
			"asset_info" => Some(Self::AssetInfo),
			"people" => Some(Self::People),
			_ => None,
		}
	}
}

impl std::fmt::Display for Intent {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		f.write_str(self.as_str())
	}
}

/// Confidence values travel a lot of wire; anything non-finite or outside
/// [0, 1] collapses to the nearest bound.
pub fn clamp_confidence(value: f32) -> f32 {
	if !value.is_finite() {
		return 0.0;
	}

	value.clamp(0.0, 1.0)
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn parses_every_label() {
		for intent in Intent::ALL {
			assert_eq!(Intent::parse(intent.as_str()), Some(intent));
		}
	}

	#[test]
	fn rejects_unknown_labels() {
		assert_eq!(Intent::parse("definition"), None);
		assert_eq!(Intent::parse(""), None);
	}

	#[test]
	fn clamps_out_of_range_confidence() {
		assert_eq!(clamp_confidence(1.5), 1.0);
		assert_eq!(clamp_confidence(-0.2), 0.0);
		assert_eq!(clamp_confidence(f32::NAN), 0.0);
	}
}
