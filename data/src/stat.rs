use std::{fmt, str::FromStr};

macro_rules! stats {
	($($variant:ident = $name:literal => [$($label:literal),+ $(,)?]),+ $(,)?) => {
		/// Every stat an essence line can show.
		///
		/// The serialized form is the SCREAMING_SNAKE_CASE name, which is also the
		/// catalog spelling and the stat-template file stem.
		#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, serde::Deserialize, serde::Serialize)]
		pub enum Stat {
			$(#[serde(rename = $name)] $variant),+
		}

		impl Stat {
			pub const ALL: &'static [Stat] = &[$(Stat::$variant),+];

			/// Catalog / file-stem spelling, e.g. `ATTACK_BOOST`.
			pub const fn name(self) -> &'static str {
				match self {
					$(Stat::$variant => $name),+
				}
			}

			/// In-game label spellings, used for fuzzy OCR matching.
			pub fn labels(self) -> &'static [&'static str] {
				match self {
					$(Stat::$variant => &[$($label),+]),+
				}
			}
		}

		impl FromStr for Stat {
			type Err = UnknownStat;

			fn from_str(s: &str) -> Result<Self, Self::Err> {
				match s {
					$($name => Ok(Stat::$variant),)+
					_ => Err(UnknownStat(s.to_owned())),
				}
			}
		}
	};
}

stats! {
	// Attributes
	AgilityBoost = "AGILITY_BOOST" => ["Agility Boost"],
	StrengthBoost = "STRENGTH_BOOST" => ["Strength Boost"],
	WillBoost = "WILL_BOOST" => ["Will Boost"],
	IntellectBoost = "INTELLECT_BOOST" => ["Intellect Boost"],
	MainAttributeBoost = "MAIN_ATTRIBUTE_BOOST" => ["Main Attribute Boost"],

	// Numeric / damage
	AttackBoost = "ATTACK_BOOST" => ["ATK Boost", "Attack Boost"],
	HpBoost = "HP_BOOST" => ["HP Boost"],
	PhysicalDmgBoost = "PHYSICAL_DMG_BOOST" => ["Physical DMG Boost"],
	HeatDmgBoost = "HEAT_DMG_BOOST" => ["Heat DMG Boost"],
	ElectricDmgBoost = "ELECTRIC_DMG_BOOST" => ["Electric DMG Boost", "Electric DMG"],
	CryoDmgBoost = "CRYO_DMG_BOOST" => ["Cryo DMG Boost"],
	NatureDmgBoost = "NATURE_DMG_BOOST" => ["Nature DMG Boost"],
	CriticalRateBoost = "CRITICAL_RATE_BOOST" => ["Critical Rate Boost"],
	OriginiumArtsBoost = "ORIGINIUM_ARTS_BOOST" => ["Originium Arts Boost"],
	UltimateGainBoost = "ULTIMATE_GAIN_BOOST" => ["Ultimate Gain Boost"],
	ArtsDmgBoost = "ARTS_DMG_BOOST" => ["Arts DMG Boost", "Arts Intensity Boost"],
	TreatmentEfficiencyBoost = "TREATMENT_EFFICIENCY_BOOST" => ["Treatment Efficiency Boost"],

	// Passive keywords
	Assault = "ASSAULT" => ["Assault"],
	Suppression = "SUPPRESSION" => ["Suppression"],
	Pursuit = "PURSUIT" => ["Pursuit"],
	Crusher = "CRUSHER" => ["Crusher"],
	Inspiring = "INSPIRING" => ["Inspiring"],
	Combative = "COMBATIVE" => ["Combative"],
	Brutality = "BRUTALITY" => ["Brutality"],
	Infliction = "INFLICTION" => ["Infliction"],
	Medicant = "MEDICANT" => ["Medicant"],
	Fracture = "FRACTURE" => ["Fracture"],
	Detonate = "DETONATE" => ["Detonate"],
	Twilight = "TWILIGHT" => ["Twilight"],
	Flow = "FLOW" => ["Flow"],
	Efficacy = "EFFICACY" => ["Efficacy"],
}

impl fmt::Display for Stat {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.write_str(self.name())
	}
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnknownStat(pub String);

impl fmt::Display for UnknownStat {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		write!(f, "unknown stat {:?}", self.0)
	}
}

impl std::error::Error for UnknownStat {}
