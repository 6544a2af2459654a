use crate::models::{count_kind, sorted_entities, Entity, EntityKind, MappedOrders, OrderLine, Size, Temperature};
use crate::services::normalize::Normalizer;

/// Flags set by the handler that runs the segmenter.
#[derive(Debug, Clone, Copy, Default)]
pub struct SegmentContext {
    pub temperature_change: bool,
    pub size_change: bool,
}

/// Result of segmenting one utterance.
#[derive(Debug, Clone, Default)]
pub struct Segmentation {
    /// Sorted input with particles stripped from every non-drink value.
    pub entities: Vec<Entity>,
    pub lines: Vec<OrderLine>,
}

impl Segmentation {
    pub fn mapped_data(&self) -> MappedOrders {
        MappedOrders::from_lines(&self.lines)
    }

    /// Value of the right-most entity of `kind`.
    pub fn last_value(&self, kind: EntityKind) -> Option<&str> {
        self.entities
            .iter()
            .rev()
            .find(|e| e.kind == kind)
            .map(|e| e.value.as_str())
    }

    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }
}

#[derive(Debug, Default)]
struct Draft {
    drink: Option<String>,
    temperature: Option<Temperature>,
    requested_temperature: Option<Temperature>,
    size: Option<Size>,
    quantity: Option<u32>,
    options: Vec<String>,
}

/// Attributes gathered for one order inside a drink mention.
#[derive(Debug, Default, Clone)]
struct Bucket {
    temperature: Option<Temperature>,
    size: Option<Size>,
    quantity: Option<u32>,
    options: Vec<String>,
}

impl Bucket {
    fn is_empty(&self) -> bool {
        self.temperature.is_none()
            && self.size.is_none()
            && self.quantity.is_none()
            && self.options.is_empty()
    }
}

#[derive(Debug, Default)]
struct Mention {
    drink: Option<String>,
    shorthand_temperature: Option<Temperature>,
    shared_temperature: Option<Temperature>,
    shared_size: Option<Size>,
    /// Quantity stated before any attribute: the number of cups the buckets share out.
    total: Option<u32>,
    buckets: Vec<Bucket>,
    current: Bucket,
}

/// Rebuilds drink orders from the flat entity stream of one utterance.
pub struct Segmenter<'a> {
    normalizer: &'a Normalizer,
    context: SegmentContext,
}

impl<'a> Segmenter<'a> {
    pub fn new(normalizer: &'a Normalizer) -> Self {
        Self {
            normalizer,
            context: SegmentContext::default(),
        }
    }

    pub fn with_context(mut self, context: SegmentContext) -> Self {
        self.context = context;
        self
    }

    pub fn segment(&self, entities: &[Entity]) -> Segmentation {
        let entities: Vec<Entity> = sorted_entities(entities)
            .into_iter()
            .map(|mut e| {
                if e.kind != EntityKind::DrinkType {
                    e.value = self.normalizer.strip_particle(&e.value);
                }
                e
            })
            .collect();

        let lines = if self.oversubscribed(&entities) {
            self.group_mentions(&entities)
        } else {
            self.scan(&entities)
        };

        Segmentation { entities, lines }
    }

    /// More attribute entities of one kind than drink mentions. In a change context the
    /// changed attribute names old and new values, so it never counts.
    fn oversubscribed(&self, entities: &[Entity]) -> bool {
        let drinks = count_kind(entities, EntityKind::DrinkType);
        [
            EntityKind::Temperature,
            EntityKind::Quantity,
            EntityKind::Size,
            EntityKind::AdditionalOptions,
        ]
        .into_iter()
        .filter(|kind| !self.changes(*kind))
        .any(|kind| count_kind(entities, kind) > drinks)
    }

    fn changes(&self, kind: EntityKind) -> bool {
        match kind {
            EntityKind::Temperature => self.context.temperature_change,
            EntityKind::Size => self.context.size_change,
            _ => false,
        }
    }

    fn default_temperature(&self, entities: &[Entity]) -> bool {
        self.context.temperature_change && count_kind(entities, EntityKind::Temperature) == 1
    }

    fn default_size(&self, entities: &[Entity]) -> bool {
        self.context.size_change && count_kind(entities, EntityKind::Size) == 1
    }

    fn scan(&self, entities: &[Entity]) -> Vec<OrderLine> {
        let default_temperature = self.default_temperature(entities);
        let default_size = self.default_size(entities);
        let mut consumed = vec![false; entities.len()];
        let mut lines = Vec::new();
        let mut draft = Draft::default();

        for (i, entity) in entities.iter().enumerate() {
            match entity.kind {
                EntityKind::DrinkType => {
                    if draft.drink.is_some() {
                        lines.push(self.complete(std::mem::take(&mut draft)));
                    }

                    if let Some((drink, temperature)) = self.normalizer.shorthand(&entity.value) {
                        draft.drink = Some(drink.to_string());
                        draft.temperature = Some(temperature);
                        draft.requested_temperature = Some(temperature);
                    } else {
                        draft.drink = Some(self.normalizer.normalize_drink(&entity.value));
                        if !default_temperature {
                            let found = self.find_temperature(entities, i);
                            draft.temperature = found;
                            draft.requested_temperature = found;
                        }
                    }

                    if !default_size {
                        if let Some(j) = self.find_size(entities, i, &consumed) {
                            consumed[j] = true;
                            draft.size = self.normalizer.size(&entities[j].value);
                        }
                    }
                }
                EntityKind::Quantity => {
                    draft.quantity = Some(self.normalizer.quantity(&entity.value));
                }
                EntityKind::Size => {
                    if !default_size && !consumed[i] {
                        if let Some(size) = self.normalizer.size(&entity.value) {
                            draft.size = Some(size);
                        }
                    }
                }
                EntityKind::AdditionalOptions => {
                    draft.options.push(self.normalizer.normalize_option(&entity.value));
                }
                _ => {}
            }
        }

        if draft.drink.is_some() {
            lines.push(self.complete(draft));
        }
        lines
    }

    /// Temperature right before the drink, else the first one after it and before the next
    /// drink, unless that one leads straight into another drink.
    fn find_temperature(&self, entities: &[Entity], i: usize) -> Option<Temperature> {
        if i > 0 && entities[i - 1].kind == EntityKind::Temperature {
            return self.normalizer.temperature(&entities[i - 1].value);
        }
        for j in i + 1..entities.len() {
            if entities[j].kind == EntityKind::DrinkType {
                break;
            }
            if entities[j].kind == EntityKind::Temperature
                && entities.get(j + 1).map(|next| next.kind) != Some(EntityKind::DrinkType)
            {
                return self.normalizer.temperature(&entities[j].value);
            }
        }
        None
    }

    /// Index of the size entity that belongs to the drink at `i`. Attached sizes are
    /// never handed to a second drink.
    fn find_size(&self, entities: &[Entity], i: usize, consumed: &[bool]) -> Option<usize> {
        let is_free_size = |j: usize| entities[j].kind == EntityKind::Size && !consumed[j];

        if i + 1 < entities.len() && is_free_size(i + 1) {
            return Some(i + 1);
        }
        if i >= 2 && entities[i - 1].kind == EntityKind::Temperature && is_free_size(i - 2) {
            return Some(i - 2);
        }
        if i >= 1 && is_free_size(i - 1) {
            return Some(i - 1);
        }
        for j in i + 1..entities.len() {
            match entities[j].kind {
                EntityKind::DrinkType => break,
                EntityKind::Size if !consumed[j] => return Some(j),
                _ => {}
            }
        }
        None
    }

    fn complete(&self, draft: Draft) -> OrderLine {
        let drink = draft.drink.unwrap_or_default();
        let temperature = self
            .normalizer
            .fixed_temperature(&drink)
            .or(draft.temperature)
            .unwrap_or(Temperature::Hot);
        let quantity = match draft.quantity {
            Some(q) if q > 0 => q,
            _ => 1,
        };

        OrderLine {
            drink,
            temperature,
            requested_temperature: draft.requested_temperature,
            size: draft.size.unwrap_or(Size::Medium),
            quantity,
            options: draft.options,
        }
    }

    /// Alternate pass for utterances such as "아메리카노 두 잔, 하나는 핫 하나는 아이스":
    /// a drink mention holds buckets of attributes and a repeated attribute kind opens a
    /// new bucket for the same drink.
    fn group_mentions(&self, entities: &[Entity]) -> Vec<OrderLine> {
        let default_temperature = self.default_temperature(entities);
        let default_size = self.default_size(entities);
        let shared = self.shared_prefixes(entities);

        let mut lines = Vec::new();
        let mut mention = Mention::default();

        for (i, entity) in entities.iter().enumerate() {
            if shared[i] {
                continue;
            }
            match entity.kind {
                EntityKind::DrinkType => {
                    if mention.drink.is_some() {
                        self.flush(std::mem::take(&mut mention), &mut lines);
                    }
                    self.name_mention(&mut mention, entities, i, default_temperature, default_size);
                }
                EntityKind::Temperature if !self.changes(EntityKind::Temperature) => {
                    if let Some(t) = self.normalizer.temperature(&entity.value) {
                        if mention.current.temperature.is_some() {
                            close_bucket(&mut mention);
                        }
                        mention.current.temperature = Some(t);
                    }
                }
                EntityKind::Size if !self.changes(EntityKind::Size) => {
                    if let Some(s) = self.normalizer.size(&entity.value) {
                        if mention.current.size.is_some() {
                            close_bucket(&mut mention);
                        }
                        mention.current.size = Some(s);
                    }
                }
                EntityKind::Quantity => {
                    let quantity = self.normalizer.quantity(&entity.value);
                    if mention.total.is_none()
                        && mention.buckets.is_empty()
                        && mention.current.is_empty()
                    {
                        mention.total = Some(quantity);
                        continue;
                    }
                    if mention.current.quantity.is_some() {
                        close_bucket(&mut mention);
                    }
                    mention.current.quantity = Some(quantity);
                }
                EntityKind::AdditionalOptions => {
                    mention
                        .current
                        .options
                        .push(self.normalizer.normalize_option(&entity.value));
                }
                _ => {}
            }
        }

        if mention.drink.is_some() {
            self.flush(mention, &mut lines);
        }
        lines
    }

    /// Marks temperature and size entities written directly in front of a drink
    /// ("아이스 라지 라떼"). Those apply to every order of that mention.
    fn shared_prefixes(&self, entities: &[Entity]) -> Vec<bool> {
        let mut shared = vec![false; entities.len()];
        for (i, entity) in entities.iter().enumerate() {
            if entity.kind != EntityKind::DrinkType {
                continue;
            }
            let mut seen_temperature = false;
            let mut seen_size = false;
            for j in (0..i).rev() {
                match entities[j].kind {
                    EntityKind::Temperature if !seen_temperature => {
                        seen_temperature = true;
                        shared[j] = true;
                    }
                    EntityKind::Size if !seen_size => {
                        seen_size = true;
                        shared[j] = true;
                    }
                    _ => break,
                }
            }
        }
        shared
    }

    fn name_mention(
        &self,
        mention: &mut Mention,
        entities: &[Entity],
        i: usize,
        default_temperature: bool,
        default_size: bool,
    ) {
        let entity = &entities[i];
        if let Some((drink, temperature)) = self.normalizer.shorthand(&entity.value) {
            mention.drink = Some(drink.to_string());
            mention.shorthand_temperature = Some(temperature);
        } else {
            mention.drink = Some(self.normalizer.normalize_drink(&entity.value));
        }

        let mut seen_temperature = false;
        let mut seen_size = false;
        for j in (0..i).rev() {
            match entities[j].kind {
                EntityKind::Temperature if !seen_temperature => {
                    seen_temperature = true;
                    if !default_temperature {
                        mention.shared_temperature =
                            self.normalizer.temperature(&entities[j].value);
                    }
                }
                EntityKind::Size if !seen_size => {
                    seen_size = true;
                    if !default_size {
                        mention.shared_size = self.normalizer.size(&entities[j].value);
                    }
                }
                _ => break,
            }
        }
    }

    fn flush(&self, mut mention: Mention, lines: &mut Vec<OrderLine>) {
        close_bucket(&mut mention);
        let mut buckets = std::mem::take(&mut mention.buckets);
        if buckets.is_empty() {
            buckets.push(Bucket::default());
        }

        // A lone bucket without its own count takes the whole total. Otherwise each bucket
        // counts as stated (1 when unstated) and unclaimed cups keep the plain attributes.
        match mention.total {
            Some(total) if buckets.len() == 1 && buckets[0].quantity.is_none() => {
                buckets[0].quantity = Some(total);
            }
            Some(total) => {
                let stated: u32 = buckets
                    .iter()
                    .map(|b| b.quantity.filter(|q| *q > 0).unwrap_or(1))
                    .sum();
                let remainder = total.saturating_sub(stated);
                if remainder > 0 {
                    buckets.insert(
                        0,
                        Bucket {
                            quantity: Some(remainder),
                            ..Bucket::default()
                        },
                    );
                }
            }
            None => {}
        }

        let drink = mention.drink.unwrap_or_default();
        let inherited = mention.shorthand_temperature.or(mention.shared_temperature);
        for bucket in buckets {
            let requested = bucket.temperature.or(inherited);
            let draft = Draft {
                drink: Some(drink.clone()),
                temperature: requested,
                requested_temperature: requested,
                size: bucket.size.or(mention.shared_size),
                quantity: bucket.quantity,
                options: bucket.options,
            };
            lines.push(self.complete(draft));
        }
    }
}

fn close_bucket(mention: &mut Mention) {
    let bucket = std::mem::take(&mut mention.current);
    if !bucket.is_empty() {
        mention.buckets.push(bucket);
    }
}
