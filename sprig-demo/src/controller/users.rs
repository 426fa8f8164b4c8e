use sprig::prelude::*;
use std::collections::BTreeMap;
use tracing::info;

/// Users endpoints under `/v1/users`
#[derive(Debug, Default)]
pub struct UsersController {
    saved: Vec<(String, String)>,
}

#[controller("/v1/users")]
impl UsersController {
    #[get("/get")]
    fn status(&self) -> &'static str {
        "Regular mapping is active!"
    }

    #[put("/put")]
    fn save(&mut self, #[query("userId")] user_id: String, #[query("userId2")] user_id2: String) {
        info!(user_id = %user_id, user_id2 = %user_id2, "Saving users");
        self.saved.push((user_id, user_id2));
    }

    #[post("/post")]
    fn process(
        &self,
        #[query("intParam")] number: i32,
        #[query("testParam")] text: String,
        #[body] values: Option<BTreeMap<String, String>>,
    ) -> Vec<String> {
        let values = values.unwrap_or_default();
        info!(number, text = %text, entries = values.len(), "Processing values");
        values
            .into_values()
            .map(|value| format!("{}:processed", value))
            .collect()
    }
}

register_controller!(
    UsersController,
    UsersController::descriptor().tag("audience", "internal")
);
