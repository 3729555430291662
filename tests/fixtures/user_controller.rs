use egin::{Context, Reply};

/// @Controller user
#[derive(Debug, Default)]
pub struct User;

impl User {
    /// @PutApi /user/:id
    /// @Summary Update a user
    /// @Params UserForm
    pub fn update(&self, ctx: &mut Context, id: i64, form: UserForm) -> Reply {
        Reply::ok()
    }

    /// @GetApi /user/:id/orders
    /// @Params OrderFilter
    pub fn orders(&self, ctx: &mut Context, id: i64) -> Reply {
        Reply::ok()
    }
}
