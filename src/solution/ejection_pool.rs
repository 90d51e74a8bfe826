use fixedbitset::FixedBitSet;

/// Customers that are currently not routed, in the order they were ejected.
/// Customers are taken out again in LIFO order.
#[derive(Clone, Debug)]
pub struct EjectionPool {
    stack: Vec<usize>,
    members: FixedBitSet,
}

impl EjectionPool {
    pub fn with_num_customers(num_customers: usize) -> Self {
        Self {
            stack: Vec::with_capacity(num_customers),
            members: FixedBitSet::with_capacity(num_customers + 1),
        }
    }

    pub fn push(&mut self, customer: usize) {
        debug_assert!(!self.members.contains(customer), "{} already in the pool", customer);
        self.members.insert(customer);
        self.stack.push(customer);
    }

    pub fn pop(&mut self) -> Option<usize> {
        let customer = self.stack.pop()?;
        self.members.set(customer, false);
        Some(customer)
    }

    pub fn contains(&self, customer: usize) -> bool {
        self.members.contains(customer)
    }

    pub fn len(&self) -> usize {
        self.stack.len()
    }

    pub fn is_empty(&self) -> bool {
        self.stack.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = usize> + '_ {
        self.stack.iter().copied()
    }

    pub fn clear(&mut self) {
        self.stack.clear();
        self.members.clear();
    }
}
