//! Curated indicator catalog and the resolver that backs keyword lookups.
//!
//! The curated table covers the indicators users ask for most, so the common
//! path never touches the network. Anything else falls back to the live
//! catalog search, whose ranked candidates are preserved on the result.

use tracing::debug;

use crate::error::{ApiError, ApiResult};
use crate::indicators::{IndicadoresClient, SeriesDescriptor};
use crate::model::{
    CoverageLevel,
    IndicatorCandidate,
    IndicatorRef,
    Periodicity,
    ResolvedIndicator,
};
use crate::transport::Transport;

/// One curated catalog entry. The table is static and bounded; matching
/// against it is synchronous and never issues a network call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CuratedIndicator {
    pub code: &'static str,
    pub name: &'static str,
    pub unit: &'static str,
    pub category: &'static str,
    pub periodicity: Periodicity,
    pub coverage: &'static [CoverageLevel],
}

impl CuratedIndicator {
    #[must_use]
    pub fn to_ref(&self) -> IndicatorRef {
        IndicatorRef {
            code: self.code.to_string(),
            name: self.name.to_string(),
            unit: self.unit.to_string(),
            periodicity: self.periodicity,
            coverage: self.coverage.to_vec(),
        }
    }

    #[must_use]
    pub fn to_candidate(&self) -> IndicatorCandidate {
        IndicatorCandidate {
            code: self.code.to_string(),
            name: self.name.to_string(),
        }
    }
}

const ALL_LEVELS: &[CoverageLevel] = &[
    CoverageLevel::National,
    CoverageLevel::State,
    CoverageLevel::Municipal,
];
const NATIONAL_AND_STATE: &[CoverageLevel] = &[CoverageLevel::National, CoverageLevel::State];
const NATIONAL_ONLY: &[CoverageLevel] = &[CoverageLevel::National];

/// The curated indicator table, ported from the original common-indicators
/// catalog and enriched with unit, cadence, and coverage metadata.
pub const CURATED_INDICATORS: &[CuratedIndicator] = &[
    CuratedIndicator {
        code: "1002000001",
        name: "Población total",
        unit: "Número de personas",
        category: "Demografía",
        periodicity: Periodicity::Annual,
        coverage: ALL_LEVELS,
    },
    CuratedIndicator {
        code: "1002000002",
        name: "Población femenina",
        unit: "Número de personas",
        category: "Demografía",
        periodicity: Periodicity::Annual,
        coverage: ALL_LEVELS,
    },
    CuratedIndicator {
        code: "1002000003",
        name: "Población masculina",
        unit: "Número de personas",
        category: "Demografía",
        periodicity: Periodicity::Annual,
        coverage: ALL_LEVELS,
    },
    CuratedIndicator {
        code: "6200240326",
        name: "Densidad de población",
        unit: "Habitantes por kilómetro cuadrado",
        category: "Demografía",
        periodicity: Periodicity::Annual,
        coverage: NATIONAL_AND_STATE,
    },
    CuratedIndicator {
        code: "381016",
        name: "Producto Interno Bruto (PIB)",
        unit: "Millones de pesos",
        category: "Economía",
        periodicity: Periodicity::Quarterly,
        coverage: NATIONAL_ONLY,
    },
    CuratedIndicator {
        code: "381017",
        name: "PIB per cápita",
        unit: "Pesos",
        category: "Economía",
        periodicity: Periodicity::Annual,
        coverage: NATIONAL_AND_STATE,
    },
    CuratedIndicator {
        code: "444612",
        name: "Tasa de desempleo",
        unit: "Porcentaje",
        category: "Empleo",
        periodicity: Periodicity::Quarterly,
        coverage: NATIONAL_AND_STATE,
    },
    CuratedIndicator {
        code: "444603",
        name: "Tasa de ocupación",
        unit: "Porcentaje",
        category: "Empleo",
        periodicity: Periodicity::Quarterly,
        coverage: NATIONAL_AND_STATE,
    },
    CuratedIndicator {
        code: "444604",
        name: "Población económicamente activa",
        unit: "Número de personas",
        category: "Empleo",
        periodicity: Periodicity::Quarterly,
        coverage: NATIONAL_AND_STATE,
    },
    CuratedIndicator {
        code: "444605",
        name: "Población ocupada",
        unit: "Número de personas",
        category: "Empleo",
        periodicity: Periodicity::Quarterly,
        coverage: NATIONAL_AND_STATE,
    },
    CuratedIndicator {
        code: "444606",
        name: "Población desocupada",
        unit: "Número de personas",
        category: "Empleo",
        periodicity: Periodicity::Quarterly,
        coverage: NATIONAL_AND_STATE,
    },
    CuratedIndicator {
        code: "216906",
        name: "Índice Nacional de Precios al Consumidor (INPC)",
        unit: "Índice",
        category: "Precios",
        periodicity: Periodicity::Monthly,
        coverage: NATIONAL_ONLY,
    },
    CuratedIndicator {
        code: "216668",
        name: "Inflación anual",
        unit: "Porcentaje",
        category: "Precios",
        periodicity: Periodicity::Monthly,
        coverage: NATIONAL_ONLY,
    },
    CuratedIndicator {
        code: "628194",
        name: "Inflación mensual",
        unit: "Porcentaje",
        category: "Precios",
        periodicity: Periodicity::Monthly,
        coverage: NATIONAL_ONLY,
    },
    CuratedIndicator {
        code: "6207019887",
        name: "Número de viviendas particulares habitadas",
        unit: "Número de viviendas",
        category: "Vivienda",
        periodicity: Periodicity::Annual,
        coverage: ALL_LEVELS,
    },
    CuratedIndicator {
        code: "6207019888",
        name: "Promedio de ocupantes por vivienda",
        unit: "Ocupantes por vivienda",
        category: "Vivienda",
        periodicity: Periodicity::Annual,
        coverage: ALL_LEVELS,
    },
    CuratedIndicator {
        code: "1002000022",
        name: "Grado promedio de escolaridad",
        unit: "Años de escolaridad",
        category: "Educación",
        periodicity: Periodicity::Annual,
        coverage: ALL_LEVELS,
    },
    CuratedIndicator {
        code: "1002000023",
        name: "Porcentaje de población analfabeta",
        unit: "Porcentaje",
        category: "Educación",
        periodicity: Periodicity::Annual,
        coverage: ALL_LEVELS,
    },
    CuratedIndicator {
        code: "6200028214",
        name: "Tasa de mortalidad infantil",
        unit: "Defunciones por cada mil nacidos vivos",
        category: "Salud",
        periodicity: Periodicity::Annual,
        coverage: NATIONAL_AND_STATE,
    },
    CuratedIndicator {
        code: "6200028221",
        name: "Esperanza de vida al nacimiento",
        unit: "Años",
        category: "Salud",
        periodicity: Periodicity::Annual,
        coverage: NATIONAL_AND_STATE,
    },
    CuratedIndicator {
        code: "628195",
        name: "Índice de marginación",
        unit: "Índice",
        category: "Desarrollo Social",
        periodicity: Periodicity::Annual,
        coverage: ALL_LEVELS,
    },
];

/// The 32 federal entities, code to name.
pub const ENTITIES: &[(&str, &str)] = &[
    ("01", "Aguascalientes"),
    ("02", "Baja California"),
    ("03", "Baja California Sur"),
    ("04", "Campeche"),
    ("05", "Coahuila"),
    ("06", "Colima"),
    ("07", "Chiapas"),
    ("08", "Chihuahua"),
    ("09", "Ciudad de México"),
    ("10", "Durango"),
    ("11", "Guanajuato"),
    ("12", "Guerrero"),
    ("13", "Hidalgo"),
    ("14", "Jalisco"),
    ("15", "México"),
    ("16", "Michoacán"),
    ("17", "Morelos"),
    ("18", "Nayarit"),
    ("19", "Nuevo León"),
    ("20", "Oaxaca"),
    ("21", "Puebla"),
    ("22", "Querétaro"),
    ("23", "Quintana Roo"),
    ("24", "San Luis Potosí"),
    ("25", "Sinaloa"),
    ("26", "Sonora"),
    ("27", "Tabasco"),
    ("28", "Tamaulipas"),
    ("29", "Tlaxcala"),
    ("30", "Veracruz"),
    ("31", "Yucatán"),
    ("32", "Zacatecas"),
];

#[must_use]
pub fn entity_name(code: &str) -> Option<&'static str> {
    ENTITIES
        .iter()
        .find(|(entity, _)| *entity == code)
        .map(|(_, name)| *name)
}

#[must_use]
pub fn curated_by_code(code: &str) -> Option<&'static CuratedIndicator> {
    CURATED_INDICATORS.iter().find(|entry| entry.code == code)
}

/// Case-insensitive substring matches against the curated table, in table
/// order.
#[must_use]
pub fn curated_matches(text: &str) -> Vec<&'static CuratedIndicator> {
    let needle = text.to_lowercase();
    CURATED_INDICATORS
        .iter()
        .filter(|entry| entry.name.to_lowercase().contains(&needle))
        .collect()
}

fn looks_like_code(query: &str) -> bool {
    !query.is_empty() && query.chars().all(|c| c.is_ascii_digit())
}

/// Resolves free-text or code references into canonical indicator metadata.
pub struct Resolver<T> {
    client: IndicadoresClient<T>,
}

impl<T> Clone for Resolver<T> {
    fn clone(&self) -> Self {
        Self {
            client: self.client.clone(),
        }
    }
}

impl<T: Transport> Resolver<T> {
    #[must_use]
    pub const fn new(client: IndicadoresClient<T>) -> Self {
        Self { client }
    }

    /// Resolves a query against the curated table first, then the live
    /// catalog.
    ///
    /// When the curated table matches at all, it wins; the live catalog is
    /// only consulted on a miss. A query matching neither source fails with
    /// `NotFound` — never with a transport error unless the live fallback
    /// call itself failed.
    ///
    /// # Errors
    /// `InvalidParameter` for an empty query, `NotFound` when both sources
    /// miss, or any transport failure from the live fallback.
    pub async fn resolve(&self, query: &str) -> ApiResult<ResolvedIndicator> {
        let trimmed = query.trim();
        if trimmed.is_empty() {
            return Err(ApiError::InvalidParameter(
                "indicator query must not be empty".to_string(),
            ));
        }
        if looks_like_code(trimmed) {
            if let Some(curated) = curated_by_code(trimmed) {
                return Ok(ResolvedIndicator {
                    indicator: curated.to_ref(),
                    candidates: vec![curated.to_candidate()],
                });
            }
        } else {
            let matches = curated_matches(trimmed);
            if let Some(first) = matches.first() {
                return Ok(ResolvedIndicator {
                    indicator: first.to_ref(),
                    candidates: matches.iter().map(|entry| entry.to_candidate()).collect(),
                });
            }
        }
        self.resolve_live(trimmed).await
    }

    /// Resolves a query against the live catalog only, bypassing the curated
    /// table. The top-ranked candidate is chosen (an exact code match wins
    /// over rank) and the full candidate list is returned alongside it.
    ///
    /// # Errors
    /// `NotFound` when the live catalog has no candidates, or any transport
    /// failure.
    pub async fn resolve_live(&self, query: &str) -> ApiResult<ResolvedIndicator> {
        let candidates = self.client.search_catalog(query).await?;
        let top = candidates
            .iter()
            .find(|candidate| candidate.code == query)
            .or_else(|| candidates.first())
            .cloned();
        let Some(top) = top else {
            return Err(ApiError::NotFound(format!(
                "no indicator matches '{query}' in the curated table or the live catalog"
            )));
        };
        let indicator = self.enrich(&top).await;
        Ok(ResolvedIndicator {
            indicator,
            candidates,
        })
    }

    /// Builds a full reference for a live candidate. Unit and cadence come
    /// from a latest-value probe; coverage is not published by the catalog,
    /// so all levels are allowed and the fetch path stays the authority.
    async fn enrich(&self, candidate: &IndicatorCandidate) -> IndicatorRef {
        let descriptor = match self.client.describe(&candidate.code).await {
            Ok(descriptor) => descriptor,
            Err(err) => {
                debug!(code = %candidate.code, error = %err, "metadata probe failed");
                SeriesDescriptor::default()
            }
        };
        IndicatorRef {
            code: candidate.code.clone(),
            name: candidate.name.clone(),
            unit: descriptor.unit.unwrap_or_default(),
            periodicity: descriptor
                .frequency
                .as_deref()
                .map_or(Periodicity::Annual, Periodicity::from_freq_descriptor),
            coverage: ALL_LEVELS.to_vec(),
        }
    }
}
