//! Macro for inline Cypher queries with named parameters.

/// Builds a [`Query`](crate::graph::Query) binding each `name = value` pair
/// as `$name`.
///
/// ```ignore
/// use graphmart::cypher;
///
/// cypher!(
///     graph,
///     "MATCH (u:User {id: $user_id})-[r:LIKES]->(p:Product {id: $product_id}) DELETE r",
///     user_id = user_id,
///     product_id = product_id,
/// )
/// .run()
/// .await?;
/// ```
#[macro_export]
macro_rules! cypher {
    ($graph:expr, $query:expr) => {
        $graph.query($query)
    };
    ($graph:expr, $query:expr, $($name:ident = $value:expr),+ $(,)?) => {
        $graph.query($query)$(.param(stringify!($name), $value))+
    };
}
