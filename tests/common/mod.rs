#![allow(dead_code)]

use std::collections::{BTreeMap, HashMap};

use objpath::{
    Evaluator, Expression, IndexPolicy, ResolveOptions, Value, impl_struct,
    object::{Args, CallError, Object, Param, Reflect, ReflectMut, Returned, Signature},
};

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Image {
    pub content: String,
}

impl_struct!(Image { "Content" => content });

impl Image {
    pub fn new(content: &str) -> Self {
        Image {
            content: content.to_string(),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct User {
    pub name: String,
    pub age: u8,
    pub score: f32,
    pub biz_state: HashMap<String, i64>,
    pub img_id_list: Vec<i64>,
    pub images: Vec<Box<Image>>,
    pub img_idx: HashMap<String, Box<Image>>,
    pub avatar: Option<Box<Image>>,
    pub tags: BTreeMap<u32, String>,
    pub flags: [bool; 3],
}

impl_struct!(fields User {
    "Name" => name,
    "Age" => age,
    "Score" => score,
    "BizState" => biz_state,
    "ImgIDList" => img_id_list,
    "Images" => images,
    "ImgIdx" => img_idx,
    "Avatar" => avatar,
    "Tags" => tags,
    "Flags" => flags,
});

impl Object for User {
    fn reflect(&self) -> Reflect<'_> {
        Reflect::Struct(self)
    }

    fn reflect_mut(&mut self) -> ReflectMut<'_> {
        ReflectMut::Struct(self)
    }

    fn method(&self, name: &str) -> Option<Signature> {
        match name {
            "FindImage" | "LocateImage" | "Thumbnail" => Some(Signature::new([Param::of::<i64>()])),
            "ImageCount" => Some(Signature::new([])),
            "Greeting" => Some(Signature::new([Param::of::<String>(), Param::Any]).variadic()),
            "Describe" => Some(Signature::new([Param::integer()])),
            "Reset" => Some(Signature::new([]).results(0)),
            _ => None,
        }
    }

    fn call(&mut self, name: &str, mut args: Args) -> Result<Returned<'_>, CallError> {
        match name {
            "FindImage" => {
                let index: i64 = args.take(0)?;
                let image = usize::try_from(index)
                    .ok()
                    .and_then(|i| self.images.get_mut(i))
                    .ok_or_else(|| CallError::Failed(format!("no image at {}", index)))?;
                Ok(Returned::Borrowed(image))
            }
            "LocateImage" => {
                let id: i64 = args.take(0)?;
                Ok(match self.img_idx.get_mut(&id.to_string()) {
                    Some(image) => Returned::Borrowed(image),
                    None => Returned::Nil,
                })
            }
            "Thumbnail" => {
                let index: i64 = args.take(0)?;
                let image = usize::try_from(index)
                    .ok()
                    .and_then(|i| self.images.get(i))
                    .map(|image| image.as_ref().clone())
                    .unwrap_or_default();
                Ok(Returned::owned(image))
            }
            "ImageCount" => Ok(Returned::owned(self.images.len())),
            "Greeting" => {
                let greeting: String = args.take(0)?;
                Ok(Returned::owned(format!(
                    "{} {} ({} extra)",
                    greeting,
                    self.name,
                    args.len() - 1
                )))
            }
            "Describe" => {
                let n = args.integer(0)?;
                Ok(Returned::owned(format!("#{}", n)))
            }
            "Reset" => {
                *self = User::default();
                Ok(Returned::Nil)
            }
            _ => Err(CallError::NoSuchMethod(name.to_string())),
        }
    }
}

pub fn user() -> User {
    User {
        name: "Tom".to_string(),
        age: 30,
        score: 1.5,
        biz_state: HashMap::from([("1".to_string(), 10), ("3".to_string(), 30)]),
        img_id_list: vec![2, 0, 1],
        images: vec![
            Box::new(Image::new("abc---1")),
            Box::new(Image::new("abc---2")),
            Box::new(Image::new("abc---3")),
        ],
        img_idx: HashMap::from([("7".to_string(), Box::new(Image::new("abc---7")))]),
        avatar: None,
        tags: BTreeMap::from([(1, "one".to_string())]),
        flags: [true, false, true],
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Comment {
    pub nick_name: String,
    pub content: String,
}

impl_struct!(Comment { "NickName" => nick_name, "Content" => content });

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Blog {
    pub title: String,
    pub role_state: HashMap<String, u32>,
    pub comment_ids: Vec<u64>,
    pub comments: HashMap<String, Box<Comment>>,
}

impl_struct!(fields Blog {
    "Title" => title,
    "RoleState" => role_state,
    "CommentIds" => comment_ids,
    "Comments" => comments,
});

impl Object for Blog {
    fn reflect(&self) -> Reflect<'_> {
        Reflect::Struct(self)
    }

    fn reflect_mut(&mut self) -> ReflectMut<'_> {
        ReflectMut::Struct(self)
    }

    fn method(&self, name: &str) -> Option<Signature> {
        match name {
            "FirstComment" => Some(Signature::new([])),
            _ => None,
        }
    }

    fn call(&mut self, name: &str, _args: Args) -> Result<Returned<'_>, CallError> {
        match name {
            "FirstComment" => Ok(match self.comments.get_mut("0") {
                Some(comment) => Returned::Borrowed(comment),
                None => Returned::Nil,
            }),
            _ => Err(CallError::NoSuchMethod(name.to_string())),
        }
    }
}

pub fn blog() -> Blog {
    Blog {
        title: "first post".to_string(),
        role_state: HashMap::new(),
        comment_ids: vec![0, 1],
        comments: HashMap::from([
            (
                "0".to_string(),
                Box::new(Comment {
                    nick_name: "ann".to_string(),
                    content: "hi".to_string(),
                }),
            ),
            (
                "1".to_string(),
                Box::new(Comment {
                    nick_name: "bob".to_string(),
                    content: "yo".to_string(),
                }),
            ),
        ]),
    }
}

/// Compiles and evaluates `path` against `root` with default options.
pub fn eval<'a>(path: &str, root: &'a mut dyn Object) -> objpath::Result<Value<'a>> {
    Expression::compile(path)?.execute(root)
}

pub fn eval_extend<'a>(path: &str, root: &'a mut dyn Object) -> objpath::Result<Value<'a>> {
    let evaluator = Evaluator::with_options(
        ResolveOptions::default().with_index_policy(IndexPolicy::Extend),
    );
    Expression::compile(path)?.execute_with(&evaluator, root)
}

/// Evaluates `path` and renders the result as a string.
pub fn read(path: &str, root: &mut dyn Object) -> String {
    eval(path, root).unwrap().to_string()
}
