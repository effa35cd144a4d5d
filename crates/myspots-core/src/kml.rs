//! KML document model and serialization
//!
//! An owned tree: the document owns its folders, folders own their
//! placemarks (and nested sub-folders in hierarchical exports). The
//! serializer writes KML 2.2 by hand; note that `<coordinates>` takes
//! longitude first, the reverse of how coordinates are stored.

/// KML 2.2 namespace
const KML_NS: &str = "http://www.opengis.net/kml/2.2";

/// A shared style definition, referenced by markers via `#id`
#[derive(Debug, Clone, PartialEq)]
pub struct StyleDef {
    pub id: String,
    pub icon_href: String,
}

/// One point annotation in the document
#[derive(Debug, Clone, PartialEq)]
pub struct Placemark {
    /// Place record id, stringified
    pub id: String,
    pub name: String,
    /// Style reference, e.g. `#icon-1534-F9A825-nodesc`
    pub style_url: String,
    pub description: String,
    /// Decimal degrees, WGS84
    pub longitude: f64,
    /// Decimal degrees, WGS84
    pub latitude: f64,
    /// Inherited from the containing folder at construction time
    pub visibility: bool,
}

/// A named grouping container
#[derive(Debug, Clone, PartialEq)]
pub struct Folder {
    pub id: String,
    pub name: String,
    pub visibility: bool,
    pub placemarks: Vec<Placemark>,
    /// Sub-folders, used only by hierarchical exports
    pub folders: Vec<Folder>,
}

impl Folder {
    pub fn new(id: impl Into<String>, name: impl Into<String>, visibility: bool) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            visibility,
            placemarks: Vec::new(),
            folders: Vec::new(),
        }
    }

    /// Total marker count, including nested folders
    pub fn marker_count(&self) -> usize {
        self.placemarks.len()
            + self
                .folders
                .iter()
                .map(|folder| folder.marker_count())
                .sum::<usize>()
    }
}

/// The root container of an export
#[derive(Debug, Clone, PartialEq)]
pub struct KmlDocument {
    pub id: String,
    pub name: String,
    pub description: String,
    /// Always true; folders carry their own visibility
    pub visibility: bool,
    pub styles: Vec<StyleDef>,
    pub folders: Vec<Folder>,
}

impl KmlDocument {
    pub fn new(
        id: impl Into<String>,
        name: impl Into<String>,
        description: impl Into<String>,
    ) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            description: description.into(),
            visibility: true,
            styles: Vec::new(),
            folders: Vec::new(),
        }
    }

    /// Total marker count across all folders
    pub fn marker_count(&self) -> usize {
        self.folders
            .iter()
            .map(|folder| folder.marker_count())
            .sum()
    }

    /// Serialize the whole tree as KML text
    pub fn to_kml(&self) -> String {
        let mut out = String::new();
        out.push_str("<?xml version=\"1.0\" encoding=\"UTF-8\"?>\n");
        out.push_str(&format!("<kml xmlns=\"{}\">\n", KML_NS));
        out.push_str(&format!("  <Document id=\"{}\">\n", escape_xml(&self.id)));
        write_text_element(&mut out, 2, "name", &self.name);
        write_text_element(&mut out, 2, "description", &self.description);
        write_text_element(&mut out, 2, "visibility", bool_to_kml(self.visibility));
        for style in &self.styles {
            write_style(&mut out, 2, style);
        }
        for folder in &self.folders {
            write_folder(&mut out, 2, folder);
        }
        out.push_str("  </Document>\n");
        out.push_str("</kml>\n");
        out
    }
}

fn bool_to_kml(value: bool) -> &'static str {
    if value {
        "1"
    } else {
        "0"
    }
}

fn indent(out: &mut String, depth: usize) {
    for _ in 0..depth {
        out.push_str("  ");
    }
}

fn write_text_element(out: &mut String, depth: usize, tag: &str, text: &str) {
    indent(out, depth);
    out.push_str(&format!("<{}>{}</{}>\n", tag, escape_xml(text), tag));
}

fn write_style(out: &mut String, depth: usize, style: &StyleDef) {
    indent(out, depth);
    out.push_str(&format!("<Style id=\"{}\">\n", escape_xml(&style.id)));
    indent(out, depth + 1);
    out.push_str("<IconStyle>\n");
    indent(out, depth + 2);
    out.push_str("<Icon>\n");
    write_text_element(out, depth + 3, "href", &style.icon_href);
    indent(out, depth + 2);
    out.push_str("</Icon>\n");
    indent(out, depth + 1);
    out.push_str("</IconStyle>\n");
    indent(out, depth);
    out.push_str("</Style>\n");
}

fn write_folder(out: &mut String, depth: usize, folder: &Folder) {
    indent(out, depth);
    out.push_str(&format!("<Folder id=\"{}\">\n", escape_xml(&folder.id)));
    write_text_element(out, depth + 1, "name", &folder.name);
    write_text_element(out, depth + 1, "visibility", bool_to_kml(folder.visibility));
    for placemark in &folder.placemarks {
        write_placemark(out, depth + 1, placemark);
    }
    for child in &folder.folders {
        write_folder(out, depth + 1, child);
    }
    indent(out, depth);
    out.push_str("</Folder>\n");
}

fn write_placemark(out: &mut String, depth: usize, placemark: &Placemark) {
    indent(out, depth);
    out.push_str(&format!(
        "<Placemark id=\"{}\">\n",
        escape_xml(&placemark.id)
    ));
    write_text_element(out, depth + 1, "name", &placemark.name);
    write_text_element(out, depth + 1, "visibility", bool_to_kml(placemark.visibility));
    write_text_element(out, depth + 1, "description", &placemark.description);
    write_text_element(out, depth + 1, "styleUrl", &placemark.style_url);
    indent(out, depth + 1);
    out.push_str("<Point>\n");
    // longitude first, per the KML coordinate order
    write_text_element(
        out,
        depth + 2,
        "coordinates",
        &format!("{},{}", placemark.longitude, placemark.latitude),
    );
    indent(out, depth + 1);
    out.push_str("</Point>\n");
    indent(out, depth);
    out.push_str("</Placemark>\n");
}

/// Escape text for XML element content and attribute values
fn escape_xml(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len());
    for ch in text.chars() {
        match ch {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            '\'' => escaped.push_str("&apos;"),
            other => escaped.push(other),
        }
    }
    escaped
}
