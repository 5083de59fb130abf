//! Vocabulary constants used by the ontology cache
//!
//! Internal-schema IRIs only. External projections are produced by
//! [`SmartIri::to_schema`](super::SmartIri::to_schema).

pub const INTERNAL_ONTOLOGY_BASE: &str = "http://www.knora.org/ontology/";
pub const API_ONTOLOGY_BASE: &str = "http://api.knora.org/ontology/";
pub const DATA_GRAPH_BASE: &str = "http://www.knora.org/data/";
pub const SHARED_ONTOLOGY_SEGMENT: &str = "shared";
pub const API_V2_SUFFIX: &str = "/v2";
pub const API_V2_SIMPLE_SUFFIX: &str = "/simple/v2";

/// Internal name of the base ontology and its API v2 name
pub const KNORA_BASE_NAME: &str = "knora-base";
pub const KNORA_API_NAME: &str = "knora-api";
pub const SALSAH_GUI_NAME: &str = "salsah-gui";

/// Shortcode of the project that owns shared ontologies
pub const SHARED_ONTOLOGIES_SHORTCODE: &str = "0000";
pub const DEFAULT_SHARED_ONTOLOGIES_PROJECT: &str =
    "http://www.knora.org/ontology/knora-admin#DefaultSharedOntologiesProject";
pub const SYSTEM_PROJECT: &str = "http://www.knora.org/ontology/knora-admin#SystemProject";

pub mod rdf {
    pub const TYPE: &str = "http://www.w3.org/1999/02/22-rdf-syntax-ns#type";
    pub const LANG_STRING: &str = "http://www.w3.org/1999/02/22-rdf-syntax-ns#langString";
}

pub mod rdfs {
    pub const LABEL: &str = "http://www.w3.org/2000/01/rdf-schema#label";
    pub const COMMENT: &str = "http://www.w3.org/2000/01/rdf-schema#comment";
    pub const SUB_CLASS_OF: &str = "http://www.w3.org/2000/01/rdf-schema#subClassOf";
    pub const SUB_PROPERTY_OF: &str = "http://www.w3.org/2000/01/rdf-schema#subPropertyOf";
}

pub mod owl {
    pub const ONTOLOGY: &str = "http://www.w3.org/2002/07/owl#Ontology";
    pub const CLASS: &str = "http://www.w3.org/2002/07/owl#Class";
    pub const OBJECT_PROPERTY: &str = "http://www.w3.org/2002/07/owl#ObjectProperty";
    pub const DATATYPE_PROPERTY: &str = "http://www.w3.org/2002/07/owl#DatatypeProperty";
    pub const ANNOTATION_PROPERTY: &str = "http://www.w3.org/2002/07/owl#AnnotationProperty";
    pub const RESTRICTION: &str = "http://www.w3.org/2002/07/owl#Restriction";
    pub const ON_PROPERTY: &str = "http://www.w3.org/2002/07/owl#onProperty";
    pub const CARDINALITY: &str = "http://www.w3.org/2002/07/owl#cardinality";
    pub const MIN_CARDINALITY: &str = "http://www.w3.org/2002/07/owl#minCardinality";
    pub const MAX_CARDINALITY: &str = "http://www.w3.org/2002/07/owl#maxCardinality";
}

pub mod xsd {
    pub const STRING: &str = "http://www.w3.org/2001/XMLSchema#string";
    pub const BOOLEAN: &str = "http://www.w3.org/2001/XMLSchema#boolean";
    pub const INTEGER: &str = "http://www.w3.org/2001/XMLSchema#integer";
    pub const NON_NEGATIVE_INTEGER: &str = "http://www.w3.org/2001/XMLSchema#nonNegativeInteger";
    pub const DECIMAL: &str = "http://www.w3.org/2001/XMLSchema#decimal";
    pub const DATE_TIME: &str = "http://www.w3.org/2001/XMLSchema#dateTime";
    pub const DATE_TIME_STAMP: &str = "http://www.w3.org/2001/XMLSchema#dateTimeStamp";
    pub const ANY_URI: &str = "http://www.w3.org/2001/XMLSchema#anyURI";
}

pub mod knora_base {
    pub const ONTOLOGY: &str = "http://www.knora.org/ontology/knora-base";

    pub const RESOURCE: &str = "http://www.knora.org/ontology/knora-base#Resource";
    pub const VALUE: &str = "http://www.knora.org/ontology/knora-base#Value";
    pub const TEXT_VALUE: &str = "http://www.knora.org/ontology/knora-base#TextValue";
    pub const INT_VALUE: &str = "http://www.knora.org/ontology/knora-base#IntValue";
    pub const BOOLEAN_VALUE: &str = "http://www.knora.org/ontology/knora-base#BooleanValue";
    pub const DECIMAL_VALUE: &str = "http://www.knora.org/ontology/knora-base#DecimalValue";
    pub const DATE_VALUE: &str = "http://www.knora.org/ontology/knora-base#DateValue";
    pub const TIME_VALUE: &str = "http://www.knora.org/ontology/knora-base#TimeValue";
    pub const URI_VALUE: &str = "http://www.knora.org/ontology/knora-base#UriValue";
    pub const COLOR_VALUE: &str = "http://www.knora.org/ontology/knora-base#ColorValue";
    pub const GEOM_VALUE: &str = "http://www.knora.org/ontology/knora-base#GeomValue";
    pub const GEONAME_VALUE: &str = "http://www.knora.org/ontology/knora-base#GeonameValue";
    pub const INTERVAL_VALUE: &str = "http://www.knora.org/ontology/knora-base#IntervalValue";
    pub const LIST_VALUE: &str = "http://www.knora.org/ontology/knora-base#ListValue";
    pub const LINK_VALUE: &str = "http://www.knora.org/ontology/knora-base#LinkValue";
    pub const FILE_VALUE: &str = "http://www.knora.org/ontology/knora-base#FileValue";
    pub const STILL_IMAGE_FILE_VALUE: &str =
        "http://www.knora.org/ontology/knora-base#StillImageFileValue";

    pub const RESOURCE_PROPERTY: &str = "http://www.knora.org/ontology/knora-base#resourceProperty";
    pub const HAS_VALUE: &str = "http://www.knora.org/ontology/knora-base#hasValue";
    pub const HAS_LINK_TO: &str = "http://www.knora.org/ontology/knora-base#hasLinkTo";
    pub const HAS_LINK_TO_VALUE: &str = "http://www.knora.org/ontology/knora-base#hasLinkToValue";
    pub const HAS_FILE_VALUE: &str = "http://www.knora.org/ontology/knora-base#hasFileValue";
    pub const HAS_STILL_IMAGE_FILE_VALUE: &str =
        "http://www.knora.org/ontology/knora-base#hasStillImageFileValue";
    pub const HAS_STANDOFF_LINK_TO: &str =
        "http://www.knora.org/ontology/knora-base#hasStandoffLinkTo";
    pub const HAS_STANDOFF_LINK_TO_VALUE: &str =
        "http://www.knora.org/ontology/knora-base#hasStandoffLinkToValue";

    pub const ATTACHED_TO_PROJECT: &str = "http://www.knora.org/ontology/knora-base#attachedToProject";
    pub const ATTACHED_TO_USER: &str = "http://www.knora.org/ontology/knora-base#attachedToUser";
    pub const CREATION_DATE: &str = "http://www.knora.org/ontology/knora-base#creationDate";
    pub const LAST_MODIFICATION_DATE: &str =
        "http://www.knora.org/ontology/knora-base#lastModificationDate";
    pub const HAS_PERMISSIONS: &str = "http://www.knora.org/ontology/knora-base#hasPermissions";
    pub const IS_DELETED: &str = "http://www.knora.org/ontology/knora-base#isDeleted";
    pub const IS_SHARED: &str = "http://www.knora.org/ontology/knora-base#isShared";
    pub const SUBJECT_CLASS_CONSTRAINT: &str =
        "http://www.knora.org/ontology/knora-base#subjectClassConstraint";
    pub const OBJECT_CLASS_CONSTRAINT: &str =
        "http://www.knora.org/ontology/knora-base#objectClassConstraint";
    pub const IS_EDITABLE: &str = "http://www.knora.org/ontology/knora-base#isEditable";
}

pub mod salsah_gui {
    pub const ONTOLOGY: &str = "http://www.knora.org/ontology/salsah-gui";
    pub const GUI_ORDER: &str = "http://www.knora.org/ontology/salsah-gui#guiOrder";
    pub const GUI_ELEMENT: &str = "http://www.knora.org/ontology/salsah-gui#guiElement";
    pub const GUI_ATTRIBUTE: &str = "http://www.knora.org/ontology/salsah-gui#guiAttribute";
    pub const SIMPLE_TEXT: &str = "http://www.knora.org/ontology/salsah-gui#SimpleText";
    pub const TEXTAREA: &str = "http://www.knora.org/ontology/salsah-gui#Textarea";
    pub const SEARCHBOX: &str = "http://www.knora.org/ontology/salsah-gui#Searchbox";
    pub const CHECKBOX: &str = "http://www.knora.org/ontology/salsah-gui#Checkbox";
}

pub mod foaf {
    pub const NAMESPACE: &str = "http://xmlns.com/foaf/0.1/";
}
