//! GeoServer REST documents.
//!
//! GeoServer's JSON is loose: empty collections come back as `""`, a
//! single element may not be wrapped in an array, and CRS fields are
//! either strings or `{"@class": ..., "$": ...}` objects. Everything is
//! read through `serde_json::Value` for that reason.

use serde_json::{Value, json};

use pgeo_entity::catalog::{BoundingBox, CatalogResourceDescriptor, GeometryType, ResourceKind};

use crate::adapter::VectorPublication;

/// Items of a `{"<outer>": {"<inner>": [...]}}` listing.
fn list_items<'a>(doc: &'a Value, outer: &str, inner: &str) -> Vec<&'a Value> {
    match doc.get(outer).and_then(|v| v.get(inner)) {
        Some(Value::Array(items)) => items.iter().collect(),
        Some(item @ Value::Object(_)) => vec![item],
        _ => Vec::new(),
    }
}

fn names(doc: &Value, outer: &str, inner: &str) -> Vec<String> {
    list_items(doc, outer, inner)
        .into_iter()
        .filter_map(|item| item.get("name").and_then(Value::as_str))
        .map(str::to_string)
        .collect()
}

/// Names from `/rest/layers.json`.
pub fn layer_names(doc: &Value) -> Vec<String> {
    names(doc, "layers", "layer")
}

/// Names from `/rest/styles.json`.
pub fn style_names(doc: &Value) -> Vec<String> {
    names(doc, "styles", "style")
}

fn crs_of(value: Option<&Value>) -> Option<String> {
    match value? {
        Value::String(s) => Some(s.clone()),
        Value::Object(map) => map.get("$").and_then(Value::as_str).map(str::to_string),
        _ => None,
    }
}

fn bbox_of(value: Option<&Value>) -> Option<BoundingBox> {
    let value = value?;
    Some(BoundingBox {
        min_x: value.get("minx")?.as_f64()?,
        min_y: value.get("miny")?.as_f64()?,
        max_x: value.get("maxx")?.as_f64()?,
        max_y: value.get("maxy")?.as_f64()?,
        crs: crs_of(value.get("crs")).unwrap_or_default(),
    })
}

fn geometry_of(feature_type: &Value) -> Option<GeometryType> {
    list_items(feature_type, "attributes", "attribute")
        .into_iter()
        .filter_map(|attribute| attribute.get("binding").and_then(Value::as_str))
        .filter(|binding| binding.contains(".geom."))
        .find_map(|binding| binding.parse().ok())
}

/// The store name, without its `workspace:` qualifier.
fn store_of(value: &Value) -> Option<String> {
    let name = value.get("store")?.get("name")?.as_str()?;
    Some(name.rsplit(':').next().unwrap_or(name).to_string())
}

/// Descriptor from `/rest/workspaces/{ws}/featuretypes/{name}.json`.
pub fn feature_type_descriptor(workspace: &str, doc: &Value) -> Option<CatalogResourceDescriptor> {
    let feature_type = doc.get("featureType")?;
    let name = feature_type.get("name")?.as_str()?.to_string();
    let source = feature_type
        .get("nativeName")
        .and_then(Value::as_str)
        .unwrap_or(&name)
        .to_string();
    Some(CatalogResourceDescriptor {
        workspace: workspace.to_string(),
        store: store_of(feature_type),
        name,
        kind: ResourceKind::Vectorial,
        source: Some(source),
        bbox: bbox_of(feature_type.get("nativeBoundingBox")),
        geometry: geometry_of(feature_type),
        crs: crs_of(feature_type.get("srs")),
        style: None,
    })
}

/// Descriptor from `/rest/workspaces/{ws}/coveragestores/{name}.json`.
pub fn coverage_store_descriptor(workspace: &str, doc: &Value) -> Option<CatalogResourceDescriptor> {
    let store = doc.get("coverageStore")?;
    let name = store.get("name")?.as_str()?.to_string();
    let kind = store
        .get("type")
        .and_then(Value::as_str)
        .and_then(ResourceKind::from_store_type)?;
    Some(CatalogResourceDescriptor {
        workspace: workspace.to_string(),
        store: Some(name.clone()),
        name,
        kind,
        source: store.get("url").and_then(Value::as_str).map(str::to_string),
        bbox: None,
        geometry: None,
        crs: None,
        style: None,
    })
}

/// CRS from `/rest/workspaces/{ws}/coveragestores/{store}/coverages/{name}.json`.
pub fn coverage_crs(doc: &Value) -> Option<String> {
    let coverage = doc.get("coverage")?;
    crs_of(coverage.get("srs")).or_else(|| crs_of(coverage.get("nativeCRS")))
}

/// Default style of a layer from `/rest/layers/{ws}:{name}.json`.
pub fn default_style(doc: &Value) -> Option<String> {
    doc.get("layer")?
        .get("defaultStyle")?
        .get("name")?
        .as_str()
        .map(str::to_string)
}

/// Body of a workspace creation.
pub fn workspace_body(workspace: &str) -> Value {
    json!({ "workspace": { "name": workspace } })
}

/// Body of a JNDI PostGIS datastore creation.
pub fn datastore_body(datastore: &str, jndi_reference: &str) -> Value {
    json!({
        "dataStore": {
            "name": datastore,
            "type": "PostGIS (JNDI)",
            "connectionParameters": {
                "entry": [
                    { "@key": "dbtype", "$": "postgis" },
                    { "@key": "jndiReferenceName", "$": jndi_reference },
                    { "@key": "schema", "$": "public" },
                    { "@key": "Expose primary keys", "$": "true" }
                ]
            }
        }
    })
}

/// Body of a feature type publication.
pub fn feature_type_body(publication: &VectorPublication) -> Value {
    let mut feature_type = json!({
        "name": publication.name,
        "nativeName": publication.table,
        "title": publication.title,
        "enabled": true,
    });
    if let Some(bbox) = &publication.bbox {
        feature_type["srs"] = json!(bbox.crs);
        feature_type["nativeBoundingBox"] = json!({
            "minx": bbox.min_x,
            "miny": bbox.min_y,
            "maxx": bbox.max_x,
            "maxy": bbox.max_y,
            "crs": bbox.crs,
        });
    }
    json!({ "featureType": feature_type })
}

/// Body of a coverage update setting its title and CRS.
pub fn coverage_body(title: &str, crs: &str) -> Value {
    json!({
        "coverage": {
            "title": title,
            "srs": crs,
            "projectionPolicy": "REPROJECT_TO_DECLARED",
            "enabled": true
        }
    })
}

/// Body of a layer update setting its default style.
pub fn layer_style_body(style: &str) -> Value {
    json!({ "layer": { "defaultStyle": { "name": style } } })
}
