//! GraphQL schema definition
//!
//! Queries and mutations live in per-entity modules and are merged here.
//! Requests must carry a fresh `Arc<RequestLoaders>` in their data (the HTTP
//! handler takes care of that) and, for guarded operations, an `AuthUser`.

use async_graphql::extensions::Tracing;
use async_graphql::{EmptySubscription, MergedObject, Schema};

use crate::services::Services;

use super::mutations::{AuthMutations, CommentMutations, PostMutations, UserMutations};
use super::queries::{CommentQueries, PostQueries, UserQueries};

/// The GraphQL schema type
pub type BlogSchema = Schema<QueryRoot, MutationRoot, EmptySubscription>;

#[derive(MergedObject, Default)]
pub struct QueryRoot(UserQueries, PostQueries, CommentQueries);

#[derive(MergedObject, Default)]
pub struct MutationRoot(AuthMutations, UserMutations, PostMutations, CommentMutations);

/// Build the GraphQL schema with all resolvers
pub fn build_schema(services: Services) -> BlogSchema {
    Schema::build(QueryRoot::default(), MutationRoot::default(), EmptySubscription)
        .data(services)
        .extension(Tracing)
        .finish()
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use async_graphql::{Request, Response, Value};
    use pretty_assertions::assert_eq;
    use serde_json::json;

    use super::*;
    use crate::db::{CreateComment, CreatePost, UserRecord};
    use crate::graphql::auth::AuthUser;
    use crate::graphql::loaders::RequestLoaders;
    use crate::services::testing;

    struct Harness {
        schema: BlogSchema,
        services: Services,
    }

    impl Harness {
        async fn new() -> Self {
            let services = testing::services().await;
            Self {
                schema: build_schema(services.clone()),
                services,
            }
        }

        async fn run(&self, query: &str, as_user: Option<&UserRecord>) -> Response {
            self.run_with(query, as_user, Arc::new(RequestLoaders::new(&self.services)))
                .await
        }

        /// Run with caller-held loaders so dispatch counts can be inspected.
        async fn run_with(
            &self,
            query: &str,
            as_user: Option<&UserRecord>,
            loaders: Arc<RequestLoaders>,
        ) -> Response {
            let mut request = Request::new(query).data(loaders);
            if let Some(user) = as_user {
                request = request.data(AuthUser {
                    user_id: user.id,
                    name: user.name.clone(),
                    email: user.email.clone(),
                });
            }
            self.schema.execute(request).await
        }

        async fn data(&self, query: &str, as_user: Option<&UserRecord>) -> serde_json::Value {
            let response = self.run(query, as_user).await;
            assert!(response.errors.is_empty(), "{:?}", response.errors);
            response.data.into_json().unwrap()
        }
    }

    fn error_code(response: &Response) -> Option<String> {
        let code = response
            .errors
            .first()?
            .extensions
            .as_ref()?
            .get("code")?
            .clone();
        match code {
            Value::String(code) => Some(code),
            _ => None,
        }
    }

    #[tokio::test]
    async fn test_nested_relations_resolve() {
        let h = Harness::new().await;
        let ada = testing::user(&h.services, "Ada").await;
        let bob = testing::user(&h.services, "Bob").await;
        let post = h
            .services
            .posts
            .create(
                ada.id,
                CreatePost {
                    title: "Hello".into(),
                    content: Some("world".into()),
                },
            )
            .await
            .unwrap();
        for (user, text) in [(&bob, "nice"), (&ada, "thanks")] {
            h.services
                .comments
                .create(
                    user.id,
                    CreateComment {
                        comment: text.into(),
                        post_id: post.id,
                    },
                )
                .await
                .unwrap();
        }

        let data = h
            .data(
                "{ allPosts { title author { name } comments { comment user { name } post { title } } } }",
                None,
            )
            .await;

        assert_eq!(
            data,
            json!({
                "allPosts": [{
                    "title": "Hello",
                    "author": { "name": "Ada" },
                    "comments": [
                        { "comment": "thanks", "user": { "name": "Ada" }, "post": { "title": "Hello" } },
                        { "comment": "nice", "user": { "name": "Bob" }, "post": { "title": "Hello" } }
                    ]
                }]
            })
        );
    }

    /// Three posts by two authors, each post with two comments.
    async fn seed_blog(h: &Harness) -> (UserRecord, UserRecord) {
        let ada = testing::user(&h.services, "Ada").await;
        let bob = testing::user(&h.services, "Bob").await;
        for (author, title) in [(&ada, "P1"), (&bob, "P2"), (&ada, "P3")] {
            let post = h
                .services
                .posts
                .create(
                    author.id,
                    CreatePost {
                        title: title.into(),
                        content: None,
                    },
                )
                .await
                .unwrap();
            for commenter in [&ada, &bob] {
                h.services
                    .comments
                    .create(
                        commenter.id,
                        CreateComment {
                            comment: format!("{} on {title}", commenter.name),
                            post_id: post.id,
                        },
                    )
                    .await
                    .unwrap();
            }
        }
        (ada, bob)
    }

    #[tokio::test]
    async fn test_sibling_relations_share_one_dispatch_per_edge() {
        let h = Harness::new().await;
        seed_blog(&h).await;
        let loaders = Arc::new(RequestLoaders::new(&h.services));

        let response = h
            .run_with(
                "{ allPosts { title author { name } comments { comment user { name } } } }",
                None,
                Arc::clone(&loaders),
            )
            .await;
        assert!(response.errors.is_empty(), "{:?}", response.errors);

        let data = response.data.into_json().unwrap();
        let posts = data["allPosts"].as_array().unwrap();
        assert_eq!(posts.len(), 3);
        assert!(posts.iter().all(|p| p["comments"].as_array().unwrap().len() == 2));
        assert_eq!(posts[1]["author"]["name"], "Bob");

        assert_eq!(loaders.post_author.dispatch_count(), 1);
        assert_eq!(loaders.post_comments.dispatch_count(), 1);
        assert_eq!(loaders.comment_user.dispatch_count(), 1);
        assert_eq!(loaders.comment_post.dispatch_count(), 0);
    }

    #[tokio::test]
    async fn test_aliased_root_selections_get_every_column() {
        let h = Harness::new().await;
        seed_blog(&h).await;
        let loaders = Arc::new(RequestLoaders::new(&h.services));

        let response = h
            .run_with(
                "{ a: allPosts { author { name } } b: allPosts { author { email } } }",
                None,
                Arc::clone(&loaders),
            )
            .await;
        assert!(response.errors.is_empty(), "{:?}", response.errors);
        let data = response.data.into_json().unwrap();

        assert_eq!(data["a"][0]["author"]["name"], "Ada");
        assert_eq!(data["b"][0]["author"]["email"], "ada@example.com");
        assert_eq!(data["b"][1]["author"]["email"], "bob@example.com");
        assert_eq!(loaders.post_author.dispatch_count(), 1);
    }

    #[tokio::test]
    async fn test_nested_selection_outside_fixed_shape_is_complete() {
        let h = Harness::new().await;
        seed_blog(&h).await;

        let data = h
            .data(
                "{ allPosts { author { name } comments { post { author { email } } } } }",
                None,
            )
            .await;

        let first = &data["allPosts"][0];
        assert_eq!(first["author"]["name"], "Ada");
        for comment in first["comments"].as_array().unwrap() {
            assert_eq!(comment["post"]["author"]["email"], "ada@example.com");
        }
        assert_eq!(
            data["allPosts"][1]["comments"][0]["post"]["author"]["email"],
            "bob@example.com"
        );
    }

    #[tokio::test]
    async fn test_user_posts_and_pagination() {
        let h = Harness::new().await;
        let ada = testing::user(&h.services, "Ada").await;
        testing::user(&h.services, "Bob").await;
        for title in ["One", "Two"] {
            h.services
                .posts
                .create(
                    ada.id,
                    CreatePost {
                        title: title.into(),
                        content: None,
                    },
                )
                .await
                .unwrap();
        }

        let data = h
            .data("{ allUsers(pagination: { limit: 1, page: 2 }) { name posts { title } } }", None)
            .await;
        assert_eq!(data, json!({ "allUsers": [{ "name": "Bob", "posts": [] }] }));

        let data = h
            .data("{ allUsers(pagination: { page: 2 }) { name posts { title } } }", None)
            .await;
        assert_eq!(
            data,
            json!({ "allUsers": [
                { "name": "Ada", "posts": [{ "title": "One" }, { "title": "Two" }] },
                { "name": "Bob", "posts": [] }
            ] })
        );
    }

    #[tokio::test]
    async fn test_guarded_operations_require_principal() {
        let h = Harness::new().await;

        let response = h.run("{ me { id } }", None).await;
        assert_eq!(error_code(&response).as_deref(), Some("UNAUTHENTICATED"));

        let response = h
            .run(
                r#"mutation { createPost(createPostInput: { title: "T1" }) { id } }"#,
                None,
            )
            .await;
        assert_eq!(error_code(&response).as_deref(), Some("UNAUTHENTICATED"));
    }

    #[tokio::test]
    async fn test_post_mutation_flow() {
        let h = Harness::new().await;
        let u1 = testing::user(&h.services, "U1").await;
        let u2 = testing::user(&h.services, "U2").await;

        let data = h
            .data(
                r#"mutation { createPost(createPostInput: { title: "T1", content: "first" }) { id title author { name } } }"#,
                Some(&u1),
            )
            .await;
        let post_id = data["createPost"]["id"].as_i64().unwrap();
        assert_eq!(data["createPost"]["author"]["name"], "U1");

        let response = h
            .run(
                r#"mutation { createPost(createPostInput: { title: "T1" }) { id } }"#,
                Some(&u2),
            )
            .await;
        assert_eq!(error_code(&response).as_deref(), Some("DUPLICATE_KEY"));
        assert_eq!(response.errors[0].message, "Title already used");

        let update = format!(
            r#"mutation {{ updatePost(id: {post_id}, updatePostInput: {{ title: "Mine now" }}) {{ title }} }}"#
        );
        let response = h.run(&update, Some(&u2)).await;
        assert_eq!(error_code(&response).as_deref(), Some("UNAUTHORIZED"));

        let update = format!(
            r#"mutation {{ updatePost(id: {post_id}, updatePostInput: {{ content: "edited" }}) {{ title content }} }}"#
        );
        let data = h.data(&update, Some(&u1)).await;
        assert_eq!(
            data,
            json!({ "updatePost": { "title": "T1", "content": "edited" } })
        );

        let remove = format!("mutation {{ removePost(id: {post_id}) }}");
        let response = h.run(&remove, Some(&u2)).await;
        assert_eq!(error_code(&response).as_deref(), Some("UNAUTHORIZED"));
        assert_eq!(h.data(&remove, Some(&u1)).await, json!({ "removePost": true }));
        assert_eq!(h.data(&remove, Some(&u1)).await, json!({ "removePost": false }));
    }

    #[tokio::test]
    async fn test_missing_entity_reports_not_found() {
        let h = Harness::new().await;
        let response = h.run("{ post(id: 999) { title } }", None).await;
        assert_eq!(error_code(&response).as_deref(), Some("NOT_FOUND"));
        assert_eq!(response.errors[0].message, "Post not found");
    }

    #[tokio::test]
    async fn test_login_and_me() {
        let h = Harness::new().await;
        let data = h
            .data(
                r#"mutation { createUser(createUserInput: { name: "Ada", email: "ada@example.com", password: "s3cret!" }) { id email } }"#,
                None,
            )
            .await;
        let id = data["createUser"]["id"].as_i64().unwrap();

        let response = h
            .run(
                r#"mutation { login(authInput: { email: "ada@example.com", password: "wrong" }) { access_token } }"#,
                None,
            )
            .await;
        assert_eq!(error_code(&response).as_deref(), Some("INVALID_CREDENTIALS"));

        let data = h
            .data(
                r#"mutation { login(authInput: { email: "ada@example.com", password: "s3cret!" }) { access_token } }"#,
                None,
            )
            .await;
        let token = data["login"]["access_token"].as_str().unwrap();
        let principal = h.services.auth.verify_token(token).unwrap();
        assert_eq!(principal.user_id, id);

        let me = h
            .services
            .users
            .find_one(id, None)
            .await
            .unwrap();
        let data = h.data("{ me { name email } }", Some(&me)).await;
        assert_eq!(data, json!({ "me": { "name": "Ada", "email": "ada@example.com" } }));
    }

    #[tokio::test]
    async fn test_user_self_service() {
        let h = Harness::new().await;
        let ada = testing::user(&h.services, "Ada").await;

        let data = h
            .data(
                r#"mutation { updateUser(updateUserInput: { name: "Ada L." }) { name email } }"#,
                Some(&ada),
            )
            .await;
        assert_eq!(
            data,
            json!({ "updateUser": { "name": "Ada L.", "email": "ada@example.com" } })
        );

        let data = h
            .data(
                r#"mutation { updateUserPassword(updateUserPasswordInput: { password: "fresh-one" }) }"#,
                Some(&ada),
            )
            .await;
        assert_eq!(data, json!({ "updateUserPassword": true }));
        assert!(h.services.auth.login("ada@example.com", "fresh-one").await.is_ok());

        assert_eq!(
            h.data("mutation { removeUser }", Some(&ada)).await,
            json!({ "removeUser": true })
        );
        assert_eq!(
            h.data("mutation { removeUser }", Some(&ada)).await,
            json!({ "removeUser": false })
        );
    }

    #[tokio::test]
    async fn test_comment_queries() {
        let h = Harness::new().await;
        let ada = testing::user(&h.services, "Ada").await;
        let post = h
            .services
            .posts
            .create(
                ada.id,
                CreatePost {
                    title: "Hello".into(),
                    content: None,
                },
            )
            .await
            .unwrap();

        let create = format!(
            r#"mutation {{ createComment(createCommentInput: {{ comment: "hi", postId: {} }}) {{ id comment post {{ title }} }} }}"#,
            post.id
        );
        let data = h.data(&create, Some(&ada)).await;
        assert_eq!(data["createComment"]["post"]["title"], "Hello");

        let query = format!(
            "{{ commentsByPostId(postId: {}) {{ comment user {{ name }} }} }}",
            post.id
        );
        let data = h.data(&query, None).await;
        assert_eq!(
            data,
            json!({ "commentsByPostId": [{ "comment": "hi", "user": { "name": "Ada" } }] })
        );
    }
}
