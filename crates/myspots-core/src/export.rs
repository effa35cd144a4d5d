//! Export pipeline: places plus category graph in, KML document out
//!
//! Pure assembly over data already loaded from the record store; no I/O
//! happens here. Any graph failure aborts the whole run so a partial
//! document is never handed back.

use tracing::debug;

use crate::graph::{CategoryGraph, GraphError, UNCATEGORIZED};
use crate::kml::{Folder, KmlDocument, Placemark, StyleDef};
use crate::models::PlaceRecord;
use crate::style;

const DOCUMENT_ID: &str = "myspots-document-id";
const DOCUMENT_NAME: &str = "myspots";
const DOCUMENT_DESCRIPTION: &str = "MySpots export";

/// Export policy flags
#[derive(Debug, Clone, Copy, Default)]
pub struct ExportOptions {
    /// Force the fallback style for every marker
    pub no_styles: bool,
    /// Start every folder hidden (the root stays visible)
    pub default_invisible: bool,
    /// Nest folders along category parent/child edges instead of flattening
    /// every resolved root directly under the document
    pub hierarchical: bool,
}

/// Assemble the KML document for a set of places
///
/// Folders are created lazily in first-seen order, keyed by resolved root
/// category; the reserved "Uncategorized" folder always exists. A place
/// resolving to N roots yields N markers. Places flagged `Permanently
/// Closed` or `Lame` yield none.
pub fn build_document(
    graph: &CategoryGraph,
    places: &[PlaceRecord],
    options: &ExportOptions,
) -> Result<KmlDocument, GraphError> {
    let folder_visible = style::folder_visibility(options.default_invisible);

    let mut doc = KmlDocument::new(DOCUMENT_ID, DOCUMENT_NAME, DOCUMENT_DESCRIPTION);
    doc.folders
        .push(Folder::new(UNCATEGORIZED, UNCATEGORIZED, folder_visible));

    for place in places {
        if style::is_excluded(&place.flags) {
            debug!(place = %place.name, "excluded from export by flags");
            continue;
        }
        if options.hierarchical {
            file_hierarchical(graph, &mut doc.folders, place, options, folder_visible)?;
        } else {
            file_flat(graph, &mut doc.folders, place, options, folder_visible)?;
        }
    }

    doc.styles = style_definitions(graph, options.no_styles);
    Ok(doc)
}

/// File one place under the folder of each of its resolved root categories
fn file_flat(
    graph: &CategoryGraph,
    folders: &mut Vec<Folder>,
    place: &PlaceRecord,
    options: &ExportOptions,
    folder_visible: bool,
) -> Result<(), GraphError> {
    for root_id in graph.resolve_roots(&place.category_ids)? {
        let (folder_name, style_url) = if root_id == UNCATEGORIZED {
            (
                UNCATEGORIZED.to_string(),
                format!("#{}", style::FALLBACK_STYLE_ID),
            )
        } else {
            let node = graph
                .node(&root_id)
                .ok_or_else(|| GraphError::UnknownCategory(root_id.clone()))?;
            let style_url = style::marker_style(
                &place.flags,
                node.icon_code.as_deref(),
                !options.no_styles,
            );
            (node.name.clone(), style_url)
        };

        // folders are keyed by display name in flat mode
        let index = ensure_child(folders, &folder_name, &folder_name, folder_visible);
        let folder = &mut folders[index];
        let placemark = make_placemark(place, style_url, &folder_name, folder.visibility);
        folder.placemarks.push(placemark);
    }
    Ok(())
}

/// File one place under every category it directly references, nesting
/// folders along the root-to-category chain
fn file_hierarchical(
    graph: &CategoryGraph,
    folders: &mut Vec<Folder>,
    place: &PlaceRecord,
    options: &ExportOptions,
    folder_visible: bool,
) -> Result<(), GraphError> {
    if place.category_ids.is_empty() {
        let index = ensure_child(folders, UNCATEGORIZED, UNCATEGORIZED, folder_visible);
        let folder = &mut folders[index];
        let placemark = make_placemark(
            place,
            format!("#{}", style::FALLBACK_STYLE_ID),
            UNCATEGORIZED,
            folder.visibility,
        );
        folder.placemarks.push(placemark);
        return Ok(());
    }

    for category_id in &place.category_ids {
        let path = graph.path_to_root(category_id)?;
        insert_along_path(graph, folders, &path, place, options, folder_visible)?;
    }
    Ok(())
}

/// Ensure the folder chain for `path` exists and append the marker at the
/// leaf. Recursion depth is the category depth, already validated acyclic
/// by the bounded root walk.
fn insert_along_path(
    graph: &CategoryGraph,
    folders: &mut Vec<Folder>,
    path: &[&str],
    place: &PlaceRecord,
    options: &ExportOptions,
    folder_visible: bool,
) -> Result<(), GraphError> {
    let (head, rest) = match path.split_first() {
        Some(split) => split,
        None => return Ok(()),
    };
    let node = graph
        .node(head)
        .ok_or_else(|| GraphError::UnknownCategory(head.to_string()))?;
    let index = ensure_child(folders, head, &node.name, folder_visible);

    if rest.is_empty() {
        let style_url =
            style::marker_style(&place.flags, node.icon_code.as_deref(), !options.no_styles);
        let folder = &mut folders[index];
        let placemark = make_placemark(place, style_url, &node.name, folder.visibility);
        folder.placemarks.push(placemark);
        Ok(())
    } else {
        insert_along_path(
            graph,
            &mut folders[index].folders,
            rest,
            place,
            options,
            folder_visible,
        )
    }
}

/// Find a child folder by id, creating it at the end if absent
fn ensure_child(folders: &mut Vec<Folder>, id: &str, name: &str, visible: bool) -> usize {
    if let Some(index) = folders.iter().position(|folder| folder.id == id) {
        return index;
    }
    folders.push(Folder::new(id, name, visible));
    folders.len() - 1
}

fn make_placemark(
    place: &PlaceRecord,
    style_url: String,
    category_name: &str,
    visibility: bool,
) -> Placemark {
    Placemark {
        id: place.id.clone(),
        name: place.name.clone(),
        style_url,
        description: description(category_name, place),
        longitude: place.longitude,
        latitude: place.latitude,
        visibility,
    }
}

/// Marker description: category name, pipe-joined tags, notes.
/// Notes may be absent, leaving an empty trailing line.
fn description(category_name: &str, place: &PlaceRecord) -> String {
    format!(
        "{}\n{}\n{}",
        category_name,
        place.tags.join(" | "),
        place.notes.as_deref().unwrap_or("")
    )
}

/// Shared style definitions for the whole document
///
/// One definition per (icon code, color band) combination across the
/// category set, icon codes deduplicated in input order, plus the single
/// fallback style every unstyled marker shares.
fn style_definitions(graph: &CategoryGraph, no_styles: bool) -> Vec<StyleDef> {
    let mut defs = vec![StyleDef {
        id: style::FALLBACK_STYLE_ID.to_string(),
        icon_href: style::ICON_HREF.to_string(),
    }];
    if no_styles {
        return defs;
    }

    let mut seen_codes: Vec<&str> = Vec::new();
    for (_, node) in graph.iter() {
        let Some(code) = node.icon_code.as_deref() else {
            continue;
        };
        if seen_codes.contains(&code) {
            continue;
        }
        seen_codes.push(code);
        for color in style::ColorBand::ALL {
            let id = style::style_id(code, color);
            if id == style::FALLBACK_STYLE_ID {
                continue;
            }
            defs.push(StyleDef {
                id,
                icon_href: style::ICON_HREF.to_string(),
            });
        }
    }
    defs
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{CategoryRecord, Flag};

    fn category(id: &str, name: &str, icon: Option<&str>, parent: Option<&str>) -> CategoryRecord {
        CategoryRecord {
            id: id.to_string(),
            name: name.to_string(),
            icon_code: icon.map(|c| c.to_string()),
            parent_id: parent.map(|p| p.to_string()),
        }
    }

    fn place(id: &str, name: &str, categories: &[&str], flags: &[Flag]) -> PlaceRecord {
        PlaceRecord {
            id: id.to_string(),
            name: name.to_string(),
            address: "1 Main St".to_string(),
            website: None,
            latitude: 37.8,
            longitude: -122.4,
            google_place_id: format!("gp-{}", id),
            google_json_data: "{}".to_string(),
            category_ids: categories.iter().map(|c| c.to_string()).collect(),
            tags: vec![],
            flags: flags.to_vec(),
            notes: None,
        }
    }

    fn test_graph() -> CategoryGraph {
        // Food (root, icon 1534) <- Bakery <- Sourdough; Parks (root, icon 1720)
        CategoryGraph::build(vec![
            category("A", "Food", Some("1534"), None),
            category("B", "Bakery", Some("1577"), Some("A")),
            category("C", "Sourdough", None, Some("B")),
            category("D", "Parks", Some("1720"), None),
        ])
        .unwrap()
    }

    fn find_folder<'a>(doc: &'a KmlDocument, name: &str) -> Option<&'a Folder> {
        doc.folders.iter().find(|folder| folder.name == name)
    }

    #[test]
    fn test_uncategorized_folder_created_eagerly() {
        let graph = test_graph();
        let doc = build_document(&graph, &[], &ExportOptions::default()).unwrap();
        assert_eq!(doc.folders.len(), 1);
        assert_eq!(doc.folders[0].name, UNCATEGORIZED);
        assert!(doc.folders[0].placemarks.is_empty());
    }

    #[test]
    fn test_place_filed_under_resolved_root() {
        let graph = test_graph();
        let places = [place("p1", "Tartine", &["C"], &[Flag::Visited])];
        let doc = build_document(&graph, &places, &ExportOptions::default()).unwrap();

        let food = find_folder(&doc, "Food").expect("Food folder");
        assert_eq!(food.placemarks.len(), 1);
        assert_eq!(food.placemarks[0].name, "Tartine");
        // root category's icon code, visited color
        assert_eq!(food.placemarks[0].style_url, "#icon-1534-0288D1-nodesc");
    }

    #[test]
    fn test_two_roots_two_markers() {
        let graph = test_graph();
        let places = [place("p1", "Picnic Bakery", &["B", "D"], &[])];
        let doc = build_document(&graph, &places, &ExportOptions::default()).unwrap();

        assert_eq!(doc.marker_count(), 2);
        assert_eq!(find_folder(&doc, "Food").unwrap().placemarks.len(), 1);
        assert_eq!(find_folder(&doc, "Parks").unwrap().placemarks.len(), 1);
    }

    #[test]
    fn test_shared_root_single_marker() {
        let graph = test_graph();
        let places = [place("p1", "Tartine", &["B", "C"], &[])];
        let doc = build_document(&graph, &places, &ExportOptions::default()).unwrap();
        assert_eq!(doc.marker_count(), 1);
    }

    #[test]
    fn test_uncategorized_place_gets_fallback_style() {
        let graph = test_graph();
        let places = [place("p1", "Mystery Spot", &[], &[Flag::Favorite])];
        let doc = build_document(&graph, &places, &ExportOptions::default()).unwrap();

        let folder = find_folder(&doc, UNCATEGORIZED).unwrap();
        assert_eq!(folder.placemarks.len(), 1);
        assert_eq!(
            folder.placemarks[0].style_url,
            format!("#{}", style::FALLBACK_STYLE_ID)
        );
    }

    #[test]
    fn test_excluded_place_yields_no_markers() {
        let graph = test_graph();
        let places = [
            place("p1", "Gone", &["A", "B", "D"], &[Flag::PermanentlyClosed]),
            place("p2", "Meh", &["D"], &[Flag::Lame]),
        ];
        let doc = build_document(&graph, &places, &ExportOptions::default()).unwrap();
        assert_eq!(doc.marker_count(), 0);
    }

    #[test]
    fn test_unknown_category_aborts_run() {
        let graph = test_graph();
        let places = [place("p1", "Broken", &["nope"], &[])];
        let result = build_document(&graph, &places, &ExportOptions::default());
        assert_eq!(
            result.err(),
            Some(GraphError::UnknownCategory("nope".to_string()))
        );
    }

    #[test]
    fn test_cycle_aborts_run() {
        let graph = CategoryGraph::build(vec![
            category("A", "Food", None, Some("B")),
            category("B", "Bakery", None, Some("A")),
        ])
        .unwrap();
        let places = [place("p1", "Tartine", &["A"], &[])];
        let result = build_document(&graph, &places, &ExportOptions::default());
        assert_eq!(result.err(), Some(GraphError::CycleDetected("A".to_string())));
    }

    #[test]
    fn test_no_styles_forces_fallback_everywhere() {
        let graph = test_graph();
        let places = [
            place("p1", "Tartine", &["B"], &[Flag::Favorite]),
            place("p2", "Dolores", &["D"], &[Flag::Queued]),
        ];
        let options = ExportOptions {
            no_styles: true,
            ..Default::default()
        };
        let doc = build_document(&graph, &places, &options).unwrap();

        for folder in &doc.folders {
            for placemark in &folder.placemarks {
                assert_eq!(
                    placemark.style_url,
                    format!("#{}", style::FALLBACK_STYLE_ID)
                );
            }
        }
        // only the fallback definition is emitted
        assert_eq!(doc.styles.len(), 1);
        assert_eq!(doc.styles[0].id, style::FALLBACK_STYLE_ID);
    }

    #[test]
    fn test_default_invisible_hides_folders_not_root() {
        let graph = test_graph();
        let places = [place("p1", "Tartine", &["B"], &[])];
        let options = ExportOptions {
            default_invisible: true,
            ..Default::default()
        };
        let doc = build_document(&graph, &places, &options).unwrap();

        assert!(doc.visibility);
        for folder in &doc.folders {
            assert!(!folder.visibility);
            for placemark in &folder.placemarks {
                assert!(!placemark.visibility);
            }
        }
    }

    #[test]
    fn test_style_definitions_cover_all_color_bands() {
        let graph = test_graph();
        let doc = build_document(&graph, &[], &ExportOptions::default()).unwrap();

        // fallback + 3 icon codes x 4 colors
        assert_eq!(doc.styles.len(), 1 + 3 * 4);
        assert!(doc
            .styles
            .iter()
            .any(|def| def.id == "icon-1534-F9A825-nodesc"));
        assert!(doc
            .styles
            .iter()
            .any(|def| def.id == "icon-1720-757575-nodesc"));
        assert_eq!(doc.styles[0].id, style::FALLBACK_STYLE_ID);
    }

    #[test]
    fn test_style_definitions_dedup_shared_icon_codes() {
        let graph = CategoryGraph::build(vec![
            category("A", "Food", Some("1534"), None),
            category("B", "Drink", Some("1534"), None),
        ])
        .unwrap();
        let doc = build_document(&graph, &[], &ExportOptions::default()).unwrap();
        assert_eq!(doc.styles.len(), 1 + 4);
    }

    #[test]
    fn test_description_lines() {
        let graph = test_graph();
        let mut tagged = place("p1", "Tartine", &["B"], &[]);
        tagged.tags = vec!["brunch".to_string(), "bread".to_string()];
        tagged.notes = Some("get the morning bun".to_string());
        let doc = build_document(&graph, &[tagged], &ExportOptions::default()).unwrap();

        let folder = find_folder(&doc, "Food").unwrap();
        assert_eq!(
            folder.placemarks[0].description,
            "Food\nbrunch | bread\nget the morning bun"
        );
    }

    #[test]
    fn test_description_missing_notes_trailing_line() {
        let graph = test_graph();
        let doc = build_document(
            &graph,
            &[place("p1", "Tartine", &["B"], &[])],
            &ExportOptions::default(),
        )
        .unwrap();
        let folder = find_folder(&doc, "Food").unwrap();
        assert_eq!(folder.placemarks[0].description, "Food\n\n");
    }

    #[test]
    fn test_hierarchical_nests_folders() {
        let graph = test_graph();
        let places = [place("p1", "Tartine", &["C"], &[Flag::Favorite])];
        let options = ExportOptions {
            hierarchical: true,
            ..Default::default()
        };
        let doc = build_document(&graph, &places, &options).unwrap();

        let food = find_folder(&doc, "Food").expect("Food folder at top level");
        assert!(food.placemarks.is_empty());
        let bakery = food
            .folders
            .iter()
            .find(|folder| folder.name == "Bakery")
            .expect("Bakery nested under Food");
        let sourdough = bakery
            .folders
            .iter()
            .find(|folder| folder.name == "Sourdough")
            .expect("Sourdough nested under Bakery");
        assert_eq!(sourdough.placemarks.len(), 1);
        // leaf category has no icon code, so the marker falls back
        assert_eq!(
            sourdough.placemarks[0].style_url,
            format!("#{}", style::FALLBACK_STYLE_ID)
        );
        assert_eq!(doc.marker_count(), 1);
    }

    #[test]
    fn test_hierarchical_uses_referenced_category_style() {
        let graph = test_graph();
        let places = [place("p1", "Tartine", &["B"], &[Flag::Favorite])];
        let options = ExportOptions {
            hierarchical: true,
            ..Default::default()
        };
        let doc = build_document(&graph, &places, &options).unwrap();

        let food = find_folder(&doc, "Food").unwrap();
        let bakery = food
            .folders
            .iter()
            .find(|folder| folder.name == "Bakery")
            .unwrap();
        assert_eq!(bakery.placemarks[0].style_url, "#icon-1577-F9A825-nodesc");
        assert_eq!(bakery.placemarks[0].description, "Bakery\n\n");
    }

    #[test]
    fn test_hierarchical_uncategorized() {
        let graph = test_graph();
        let places = [place("p1", "Mystery Spot", &[], &[])];
        let options = ExportOptions {
            hierarchical: true,
            ..Default::default()
        };
        let doc = build_document(&graph, &places, &options).unwrap();
        let folder = find_folder(&doc, UNCATEGORIZED).unwrap();
        assert_eq!(folder.placemarks.len(), 1);
    }

    #[test]
    fn test_folder_order_is_first_seen() {
        let graph = test_graph();
        let places = [
            place("p1", "Dolores", &["D"], &[]),
            place("p2", "Tartine", &["B"], &[]),
        ];
        let doc = build_document(&graph, &places, &ExportOptions::default()).unwrap();
        let names: Vec<&str> = doc.folders.iter().map(|f| f.name.as_str()).collect();
        assert_eq!(names, vec![UNCATEGORIZED, "Parks", "Food"]);
    }

    #[test]
    fn test_export_is_deterministic() {
        let graph = test_graph();
        let mut tagged = place("p1", "Tartine", &["B", "D"], &[Flag::Visited]);
        tagged.tags = vec!["bread".to_string()];
        let places = [tagged, place("p2", "Mystery", &[], &[])];

        let first = build_document(&graph, &places, &ExportOptions::default()).unwrap();
        let second = build_document(&graph, &places, &ExportOptions::default()).unwrap();
        assert_eq!(first.to_kml(), second.to_kml());
    }
}
