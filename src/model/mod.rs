//! Dataset structure model: variables and their roles as the service serves them.

use serde::{Deserialize, Serialize};

/// Classification of a variable inside a dataset structure.
///
/// The service reports roles as plain strings; anything outside the three
/// well-known values is kept verbatim in `Other`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum Role {
    Identifier,
    Measure,
    Attribute,
    Other(String),
}

impl From<String> for Role {
    fn from(value: String) -> Self {
        match value.as_str() {
            "IDENTIFIER" => Role::Identifier,
            "MEASURE" => Role::Measure,
            "ATTRIBUTE" => Role::Attribute,
            _ => Role::Other(value),
        }
    }
}

impl From<Role> for String {
    fn from(role: Role) -> Self {
        match role {
            Role::Identifier => "IDENTIFIER".into(),
            Role::Measure => "MEASURE".into(),
            Role::Attribute => "ATTRIBUTE".into(),
            Role::Other(value) => value,
        }
    }
}

impl Role {
    pub fn as_str(&self) -> &str {
        match self {
            Role::Identifier => "IDENTIFIER",
            Role::Measure => "MEASURE",
            Role::Attribute => "ATTRIBUTE",
            Role::Other(value) => value,
        }
    }
}

/// One column of a dataset structure.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Variable {
    pub name: String,
    #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
    pub r#type: Option<String>,
    pub role: Role,
}

/// Display rank of a variable: identifiers first, then measures, then
/// attributes, then everything else.
pub fn role_order(variable: &Variable) -> u8 {
    match variable.role {
        Role::Identifier => 1,
        Role::Measure => 2,
        Role::Attribute => 3,
        Role::Other(_) => 4,
    }
}

/// Sort variables by role for display. The sort is stable, so variables with
/// the same role keep the order the service listed them in.
pub fn sort_by_role(variables: &mut [Variable]) {
    variables.sort_by_key(role_order);
}

#[cfg(test)]
mod tests {
    use super::*;

    fn var(name: &str, role: Role) -> Variable {
        Variable { name: name.into(), r#type: None, role }
    }

    #[test]
    fn role_round_trips_through_strings() {
        assert_eq!(Role::from("IDENTIFIER".to_string()), Role::Identifier);
        assert_eq!(Role::from("MEASURE".to_string()), Role::Measure);
        assert_eq!(Role::from("ATTRIBUTE".to_string()), Role::Attribute);
        assert_eq!(
            Role::from("WEIGHT".to_string()),
            Role::Other("WEIGHT".into())
        );
        assert_eq!(String::from(Role::Other("WEIGHT".into())), "WEIGHT");
    }

    #[test]
    fn variable_deserializes_from_service_json() {
        let v: Variable = serde_json::from_str(
            r#"{"name": "periode", "type": "String", "role": "IDENTIFIER"}"#,
        )
        .expect("valid variable json");
        assert_eq!(v.name, "periode");
        assert_eq!(v.r#type.as_deref(), Some("String"));
        assert_eq!(v.role, Role::Identifier);
    }

    #[test]
    fn sort_is_stable_within_equal_roles() {
        let mut vars = vec![
            var("attr", Role::Attribute),
            var("id_first", Role::Identifier),
            var("measure", Role::Measure),
            var("id_second", Role::Identifier),
        ];
        sort_by_role(&mut vars);
        let names: Vec<&str> = vars.iter().map(|v| v.name.as_str()).collect();
        assert_eq!(names, vec!["id_first", "id_second", "measure", "attr"]);
    }

    #[test]
    fn unknown_roles_sort_last() {
        let mut vars = vec![
            var("weight", Role::Other("WEIGHT".into())),
            var("id", Role::Identifier),
        ];
        sort_by_role(&mut vars);
        assert_eq!(vars[0].name, "id");
        assert_eq!(vars[1].name, "weight");
    }
}
