use egin::{Context, Reply};
use serde::Deserialize;

pub static PHONE_RULE: validate::CustomValidateFunc = validate::phone;

/// @Controller order Order management
#[derive(Debug, Default)]
pub struct Order;

#[derive(Debug, Default, Deserialize)]
pub struct OrderFilter {
    #[tag(json = "id", in = "path", label = "Order id", binding = "required,min=1")]
    pub id: i64,
    #[tag(json = "status", in = "query", label = "Order status")]
    pub status: String,
}

impl Order {
    /// @GetApi /order/:id
    /// @Middleware Auth
    /// @Summary Get one order
    /// @Params OrderFilter
    pub fn get(&self, ctx: &mut Context, id: i64, params: OrderFilter) -> Reply {
        Reply::ok()
    }

    /// @DeleteApi /order/:id
    /// @Middleware Auth RateLimit(10)
    /// @Tag order admin
    pub fn delete(&self, ctx: &mut Context, id: i64) -> Reply {
        Reply::ok()
    }

    /// @PostApi /order/:id/ping
    pub fn ping(&self, ctx: &mut Context) {}

    /// @AnyApi /order/lookup
    /// @Desc Looks an order up by its public code
    pub fn lookup(ctx: &mut Context, query: LookupQuery) -> Reply {
        Reply::ok()
    }

    /// Recalculates totals; not exposed.
    /// @GetApi /order/recalculate
    pub fn recalculate(&self, ctx: &mut Context) -> Reply {
        Reply::ok()
    }
}

/// Internal helper without any API.
pub struct OrderCache;

impl OrderCache {
    pub fn warm(&self) {}
}
