use mockall::mock;
use order_engine::{
    db_types::{Money, NewOrder, Order, OrderId, OrderStatusChange, StatusChange},
    order_objects::OrderQueryFilter,
    traits::{OrderManagement, OrderStoreError},
};

mock! {
    pub OrderStore {}
    impl OrderManagement for OrderStore {
        fn url(&self) -> &str;
        async fn insert_order(&self, order: NewOrder) -> Result<Order, OrderStoreError>;
        async fn fetch_order_by_id(&self, order_id: &OrderId) -> Result<Option<Order>, OrderStoreError>;
        async fn fetch_orders_for_user(&self, user_id: &str) -> Result<Vec<Order>, OrderStoreError>;
        async fn fetch_all_orders(&self) -> Result<Vec<Order>, OrderStoreError>;
        async fn search_orders(&self, query: OrderQueryFilter) -> Result<Vec<Order>, OrderStoreError>;
        async fn update_order_status(&self, order_id: &OrderId, change: StatusChange) -> Result<Option<Order>, OrderStoreError>;
        async fn update_commission(&self, order_id: &OrderId, commission: Money) -> Result<Option<Order>, OrderStoreError>;
        async fn fetch_status_history(&self, order_id: &OrderId) -> Result<Vec<OrderStatusChange>, OrderStoreError>;
        async fn close(&mut self) -> Result<(), OrderStoreError>;
    }
}
