use super::codec::{encode_value, FieldValue};
use super::models::{
    CollectionSelector, CompositeFilter, CompositeOperator, Direction, FieldFilter, FieldOperator,
    FieldReference, Order, QueryFilter, StructuredQuery,
};

/// A structured-query description: one collection scan with equality/ordering
/// filters and an optional sort. Built independently of a client, never
/// persisted; only used to produce the wire `runQuery` payload.
#[derive(Clone, Debug)]
pub struct Query {
    pub(crate) collection_id: String,
    filters: Vec<(String, FieldOperator, FieldValue)>,
    order: Vec<(String, Direction)>,
    limit: Option<i32>,
}

impl Query {
    /// Creates a new query targeting the specified collection.
    pub fn new(collection_id: impl Into<String>) -> Self {
        Self {
            collection_id: collection_id.into(),
            filters: Vec::new(),
            order: Vec::new(),
            limit: None,
        }
    }

    /// Adds a filter. Multiple filters combine with AND.
    pub fn filter(
        mut self,
        field: impl Into<String>,
        op: FieldOperator,
        value: impl Into<FieldValue>,
    ) -> Self {
        self.filters.push((field.into(), op, value.into()));
        self
    }

    /// Sorts the results by the specified field.
    pub fn order_by(mut self, field: impl Into<String>, direction: Direction) -> Self {
        self.order.push((field.into(), direction));
        self
    }

    /// Limits the number of documents returned.
    pub fn limit(mut self, limit: i32) -> Self {
        self.limit = Some(limit);
        self
    }

    pub(crate) fn to_wire(&self) -> StructuredQuery {
        let mut filters: Vec<QueryFilter> = self
            .filters
            .iter()
            .map(|(field, op, value)| {
                QueryFilter::FieldFilter(FieldFilter {
                    field: FieldReference {
                        field_path: field.clone(),
                    },
                    op: *op,
                    value: encode_value(value),
                })
            })
            .collect();

        let where_clause = match filters.len() {
            0 => None,
            1 => filters.pop(),
            _ => Some(QueryFilter::CompositeFilter(CompositeFilter {
                op: CompositeOperator::And,
                filters,
            })),
        };

        let order_by = if self.order.is_empty() {
            None
        } else {
            Some(
                self.order
                    .iter()
                    .map(|(field, direction)| Order {
                        field: FieldReference {
                            field_path: field.clone(),
                        },
                        direction: *direction,
                    })
                    .collect(),
            )
        };

        StructuredQuery {
            from: Some(vec![CollectionSelector {
                collection_id: self.collection_id.clone(),
            }]),
            where_clause,
            order_by,
            limit: self.limit,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn single_filter_serializes_as_field_filter() {
        let wire = Query::new("reports")
            .filter("authorUid", FieldOperator::Equal, "u1")
            .to_wire();

        assert_eq!(
            serde_json::to_value(&wire).unwrap(),
            serde_json::json!({
                "from": [{ "collectionId": "reports" }],
                "where": {
                    "fieldFilter": {
                        "field": { "fieldPath": "authorUid" },
                        "op": "EQUAL",
                        "value": { "stringValue": "u1" }
                    }
                }
            })
        );
    }

    #[test]
    fn multiple_filters_compose_with_and() {
        let wire = Query::new("reports")
            .filter("authorUid", FieldOperator::Equal, "u1")
            .filter("badgeNumber", FieldOperator::GreaterThanOrEqual, 10)
            .order_by("createdAt", Direction::Descending)
            .limit(25)
            .to_wire();

        let json = serde_json::to_value(&wire).unwrap();
        assert_eq!(json["where"]["compositeFilter"]["op"], "AND");
        assert_eq!(
            json["where"]["compositeFilter"]["filters"]
                .as_array()
                .unwrap()
                .len(),
            2
        );
        assert_eq!(json["orderBy"][0]["direction"], "DESCENDING");
        assert_eq!(json["limit"], 25);
    }
}
