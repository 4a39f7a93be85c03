//! Section building and ordering.

use std::cmp::Ordering;
use std::collections::{BTreeMap, BTreeSet};

use super::config::{CategorizationConfig, PackageNamingConfig, SectionConfig, Strategy};
use super::types::{
    CategoryMap, ChangelogSection, FlatSection, PackageInfo, PackageSection, PlanSubsection,
    SharedCommit,
};
use crate::util::locale_cmp;

/// Heading depth of top-level sections.
pub const SECTION_LEVEL: u8 = 3;
/// Heading depth of plan subsections.
pub const SUBSECTION_LEVEL: u8 = 4;

/// Package name → version, as found in the workspace.
pub type VersionMap = BTreeMap<String, String>;

/// Turn a category map into top-level sections.
///
/// Sections come out in build order; run [`sort_sections`] afterwards.
#[must_use]
pub fn build_sections(
    categories: &CategoryMap,
    config: &CategorizationConfig,
    versions: &VersionMap,
) -> Vec<ChangelogSection> {
    match (config.strategy, config.package_naming.as_ref()) {
        (Strategy::Package, Some(naming)) => {
            build_package_sections(categories, naming, &config.sections, versions)
        },
        _ => build_component_sections(categories, &config.sections),
    }
}

fn flat(key: &str, commits: &[SharedCommit]) -> ChangelogSection {
    ChangelogSection::Flat(FlatSection {
        key: key.to_string(),
        level: SECTION_LEVEL,
        commits: commits.to_vec(),
    })
}

fn build_component_sections(
    categories: &CategoryMap,
    sections: &SectionConfig,
) -> Vec<ChangelogSection> {
    let fallback = sections.fallback_section.as_deref();
    let mut out = Vec::with_capacity(categories.len());

    if let Some(key) = fallback {
        if let Some(commits) = categories.get(key).filter(|c| !c.is_empty()) {
            out.push(flat(key, commits));
        }
    }

    let mut keys: Vec<&String> = categories
        .keys()
        .filter(|key| Some(key.as_str()) != fallback)
        .collect();
    keys.sort_by(|a, b| locale_cmp(a, b));
    out.extend(keys.into_iter().map(|key| flat(key, &categories[key])));
    out
}

/// Where a category key belongs in the package layout.
enum Slot<'a> {
    /// A base package or one of its plan variants.
    Group { base: &'a str },
    /// A generic scope, rendered flat.
    Generic,
    /// A key only seen in data (for example a category override).
    Adhoc,
}

fn slot_of<'a>(key: &'a str, naming: &'a PackageNamingConfig) -> Slot<'a> {
    if naming.is_generic(key) {
        return Slot::Generic;
    }
    if naming.mappings.values().any(|base| base == key) {
        return Slot::Group { base: key };
    }
    for plan in &naming.plans {
        if let Some((base, _)) = plan.packages.iter().find(|(_, variant)| *variant == key) {
            return Slot::Group { base };
        }
    }
    Slot::Adhoc
}

fn build_package_sections(
    categories: &CategoryMap,
    naming: &PackageNamingConfig,
    sections: &SectionConfig,
    versions: &VersionMap,
) -> Vec<ChangelogSection> {
    let fallback = sections.fallback_section.as_deref();

    let mut universe: BTreeSet<&str> = naming.mappings.values().map(String::as_str).collect();
    universe.extend(
        naming
            .plans
            .iter()
            .flat_map(|plan| plan.packages.values().map(String::as_str)),
    );
    universe.extend(naming.generic_scopes.iter().map(String::as_str));
    universe.extend(categories.keys().map(String::as_str));

    let mut groups: BTreeSet<&str> = BTreeSet::new();
    let mut out = Vec::new();

    for key in universe {
        if Some(key) == fallback {
            continue;
        }
        match slot_of(key, naming) {
            Slot::Group { base } => {
                groups.insert(base);
            },
            Slot::Generic | Slot::Adhoc => {
                if let Some(commits) = categories.get(key).filter(|c| !c.is_empty()) {
                    out.push(flat(key, commits));
                }
            },
        }
    }

    for base in groups {
        out.push(package_group(base, categories, naming, versions));
    }

    if let Some(key) = fallback {
        if let Some(commits) = categories.get(key).filter(|c| !c.is_empty()) {
            out.push(flat(key, commits));
        }
    }

    out
}

fn package_group(
    base: &str,
    categories: &CategoryMap,
    naming: &PackageNamingConfig,
    versions: &VersionMap,
) -> ChangelogSection {
    let subsection = |key: &str, plan: Option<&str>| PlanSubsection {
        key: key.to_string(),
        level: SUBSECTION_LEVEL,
        commits: categories.get(key).cloned().unwrap_or_default(),
        package: PackageInfo {
            name: key.to_string(),
            version: versions.get(key).cloned(),
            plan: plan.map(str::to_string),
        },
    };

    let mut subsections = vec![subsection(base, None)];
    for plan in naming.plan_names() {
        if let Some(variant) = naming.plan_package(plan, base) {
            subsections.push(subsection(variant, Some(plan)));
        }
    }

    ChangelogSection::Package(PackageSection {
        key: base.to_string(),
        level: SECTION_LEVEL,
        subsections,
    })
}

/// Order top-level sections by configured priority, then by key.
///
/// Unlisted keys have priority 0. The sort is stable and leaves
/// subsections alone.
#[must_use]
pub fn sort_sections(
    mut sections: Vec<ChangelogSection>,
    order: &BTreeMap<String, i32>,
) -> Vec<ChangelogSection> {
    let priority = |section: &ChangelogSection| order.get(section.key()).copied().unwrap_or(0);
    sections.sort_by(|a, b| match priority(a).cmp(&priority(b)) {
        Ordering::Equal => locale_cmp(a.key(), b.key()),
        other => other,
    });
    sections
}
