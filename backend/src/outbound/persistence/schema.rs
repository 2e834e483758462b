//! Diesel table definitions for the PostgreSQL schema.
//!
//! These definitions must match `backend/migrations` exactly. Regenerate with
//! `diesel print-schema` after changing a migration.

diesel::table! {
    /// Mirror of user-service accounts read by the workers.
    users (id) {
        id -> Text,
        email -> Nullable<Text>,
        created_at -> Timestamptz,
    }
}

diesel::table! {
    /// Posts with their like set and top-level comment counter.
    ///
    /// A check constraint keeps `like_count = cardinality(liked_users)`.
    posts (id) {
        id -> Uuid,
        author_id -> Text,
        title -> Text,
        body -> Text,
        visible -> Bool,
        group_id -> Nullable<Text>,
        like_count -> Int4,
        liked_users -> Array<Text>,
        comment_count -> Int4,
        created_at -> Timestamptz,
        updated_at -> Timestamptz,
    }
}

diesel::table! {
    /// Top-level comments; deleted with their post.
    comments (id) {
        id -> Uuid,
        post_id -> Uuid,
        author_id -> Text,
        body -> Text,
        like_count -> Int4,
        liked_users -> Array<Text>,
        created_at -> Timestamptz,
        updated_at -> Timestamptz,
    }
}

diesel::table! {
    /// Replies to top-level comments; deleted with their parent.
    child_comments (id) {
        id -> Uuid,
        parent_id -> Uuid,
        author_id -> Text,
        body -> Text,
        like_count -> Int4,
        liked_users -> Array<Text>,
        created_at -> Timestamptz,
        updated_at -> Timestamptz,
    }
}

diesel::table! {
    /// Append-only points ledger.
    reward_ledger (id) {
        id -> Int8,
        user_id -> Text,
        action -> Text,
        amount -> Int4,
        issued_at -> Timestamptz,
    }
}

diesel::table! {
    /// Durable broker storage. A non-null `locked_until` in the future marks
    /// a message as claimed.
    queue_messages (id) {
        id -> Uuid,
        queue -> Text,
        payload -> Bytea,
        enqueued_at -> Timestamptz,
        available_at -> Timestamptz,
        locked_until -> Nullable<Timestamptz>,
        delivery_count -> Int4,
    }
}

diesel::joinable!(comments -> posts (post_id));
diesel::joinable!(child_comments -> comments (parent_id));
diesel::joinable!(reward_ledger -> users (user_id));

diesel::allow_tables_to_appear_in_same_query!(
    users,
    posts,
    comments,
    child_comments,
    reward_ledger,
    queue_messages,
);
