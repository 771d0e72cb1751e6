use crate::cluster::types::{ExpandedObject, RawObject, ResourceGroup};
use crate::error::PipelineError;

use super::scheme::{pluralize, Scheme};

/// Creation-ready descriptor for one expanded template object.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResourceMapping {
    /// Position of the object in the expansion output
    pub index: usize,
    pub name: String,
    pub kind: String,
    /// REST resource name, e.g. `buildconfigs`
    pub resource: String,
    /// Exact bytes returned by expansion; never re-encoded
    pub raw: Vec<u8>,
    pub group: ResourceGroup,
}

/// Maps expanded objects into resource descriptors.
///
/// Every object is classified independently; a failing object leaves no
/// entry behind and contributes one error. Successful entries keep their
/// expansion index.
pub fn map_template_resources(
    objects: &[ExpandedObject],
    scheme: &Scheme,
) -> (Vec<ResourceMapping>, Vec<PipelineError>) {
    let mut mappings = Vec::with_capacity(objects.len());
    let mut errors = Vec::new();

    for (index, object) in objects.iter().enumerate() {
        match map_object(index, object, scheme) {
            Ok(mapping) => mappings.push(mapping),
            Err(err) => errors.push(err),
        }
    }

    (mappings, errors)
}

fn map_object(
    index: usize,
    object: &ExpandedObject,
    scheme: &Scheme,
) -> Result<ResourceMapping, PipelineError> {
    let raw: &RawObject = match object {
        ExpandedObject::Raw(raw) => raw,
        ExpandedObject::Other(value) => {
            return Err(PipelineError::NotRawObject(value.to_string()));
        }
    };

    let obj = scheme.decode(raw)?;
    let kind = scheme.kind_of(&obj)?;
    let resource = pluralize(kind);
    let name = scheme.name_of(&obj)?;

    Ok(ResourceMapping {
        index,
        name: name.to_string(),
        kind: kind.to_string(),
        resource,
        raw: raw.raw.clone(),
        group: scheme.group_of(kind),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    const SERVICE: &str = r#"{"apiVersion":"v1","kind":"Service","metadata":{"name":"jenkins"},"spec":{"ports":[{"port":80}]}}"#;
    const BUILD_CONFIG: &str =
        r#"{"kind":"BuildConfig","apiVersion":"v1","metadata":{"name":"sample-pipeline"}}"#;

    #[test]
    fn test_maps_objects_in_order() {
        let objects = vec![
            ExpandedObject::raw(SERVICE),
            ExpandedObject::raw(BUILD_CONFIG),
        ];

        let (mappings, errors) = map_template_resources(&objects, &Scheme::default());

        assert!(errors.is_empty());
        assert_eq!(mappings.len(), 2);

        assert_eq!(mappings[0].index, 0);
        assert_eq!(mappings[0].kind, "Service");
        assert_eq!(mappings[0].name, "jenkins");
        assert_eq!(mappings[0].resource, "services");
        assert_eq!(mappings[0].group, ResourceGroup::Core);

        assert_eq!(mappings[1].index, 1);
        assert_eq!(mappings[1].resource, "buildconfigs");
        assert_eq!(mappings[1].group, ResourceGroup::Origin);
    }

    #[test]
    fn test_raw_bytes_are_preserved_exactly() {
        let spaced = "{ \"kind\" : \"Secret\",\n  \"apiVersion\":\"v1\", \"metadata\":{\"name\":\"s\"} }";
        let (mappings, errors) =
            map_template_resources(&[ExpandedObject::raw(spaced)], &Scheme::default());

        assert!(errors.is_empty());
        assert_eq!(mappings[0].raw, spaced.as_bytes());
    }

    #[test]
    fn test_one_bad_object_does_not_block_siblings() {
        let objects = vec![
            ExpandedObject::raw(SERVICE),
            ExpandedObject::Other(json!("typed")),
            ExpandedObject::raw("{broken"),
            ExpandedObject::raw(r#"{"apiVersion":"v1","kind":"Widget","metadata":{"name":"w"}}"#),
            ExpandedObject::raw(r#"{"apiVersion":"v1","kind":"Route","metadata":{}}"#),
            ExpandedObject::raw(BUILD_CONFIG),
        ];

        let (mappings, errors) = map_template_resources(&objects, &Scheme::default());

        assert_eq!(mappings.len(), 2);
        assert_eq!(mappings[0].index, 0);
        assert_eq!(mappings[1].index, 5);

        assert_eq!(errors.len(), 4);
        assert_eq!(
            errors[0].to_string(),
            "unable to convert \"typed\" to unknown object"
        );
        assert!(matches!(errors[1], PipelineError::Decode(_)));
        assert!(matches!(errors[2], PipelineError::UnknownKind(_)));
        assert!(matches!(errors[3], PipelineError::UnknownName(_)));
    }

    #[test]
    fn test_empty_expansion() {
        let (mappings, errors) = map_template_resources(&[], &Scheme::default());
        assert!(mappings.is_empty());
        assert!(errors.is_empty());
    }
}
